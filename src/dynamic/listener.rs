//! Listener Registry
//!
//! Observers are kept in a copy-on-write list. A notification cycle iterates the
//! list it loaded when it started, so a concurrent registration is never seen
//! half-way and never disturbs the cycle.

use super::DynamicConfig;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Observer of installed snapshots
///
/// Listeners run on the reloading thread while the store's reload lock is
/// held. Reading the store and registering further listeners is fine; calling
/// [`DynamicConfig::reload`] on the same store deadlocks.
pub trait ConfigListener: Send + Sync {
    /// Called with the store after a snapshot was installed
    fn on_load(&self, config: &DynamicConfig) -> anyhow::Result<()>;
}

impl<F> ConfigListener for F
where
    F: Fn(&DynamicConfig) -> anyhow::Result<()> + Send + Sync,
{
    fn on_load(&self, config: &DynamicConfig) -> anyhow::Result<()> {
        self(config)
    }
}

/// Append-only set of listeners
pub struct ListenerRegistry {
    listeners: ArcSwap<Vec<Arc<dyn ConfigListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append a listener
    pub fn push(&self, listener: Arc<dyn ConfigListener>) {
        self.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&listener));
            next
        });
    }

    /// Point-in-time view of the registered listeners
    pub fn snapshot(&self) -> Arc<Vec<Arc<dyn ConfigListener>>> {
        self.listeners.load_full()
    }

    pub fn len(&self) -> usize {
        self.listeners.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
