//! Dynamic Config Store
//!
//! Holds the current snapshot of one properties source and replaces it
//! wholesale on every reload. Readers load the snapshot through an atomic
//! pointer and never wait for a reload; reloads serialize on a mutex that
//! covers parse, install and listener notification.
//!
//! A second, short-lived registration lock orders `add_listener` against the
//! point where a reload marks the store loaded, so a listener registered while
//! a cycle is notifying is either called by that cycle or called on
//! registration.

use super::{ConfigListener, ListenerRegistry, Snapshot};
use crate::binder::coerce::parse_bool;
use crate::error::ConfigError;
use crate::properties::{parse_file, ResourceLocator};
use crate::Result;
use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::UNIX_EPOCH;
use tracing::{debug, error, info};

/// Hot-reloadable view over a properties source
#[derive(Debug)]
pub struct DynamicConfig {
    name: String,
    locator: ResourceLocator,
    file: ArcSwapOption<PathBuf>,
    snapshot: ArcSwapOption<Snapshot>,
    loaded: AtomicBool,
    listeners: ListenerRegistry,
    reload_lock: Mutex<()>,
    registration_lock: Mutex<()>,
}

impl DynamicConfig {
    /// Create a store for `name` without loading it
    ///
    /// With `fail_on_missing` set, an unresolvable source is an error; otherwise
    /// the source is resolved again lazily until it appears.
    pub fn new(name: impl Into<String>, locator: ResourceLocator, fail_on_missing: bool) -> Result<Self> {
        let name = name.into();
        let file = locator.locate(&name);

        if fail_on_missing && file.is_none() {
            return Err(ConfigError::SourceNotFound { name });
        }
        if file.is_none() {
            debug!("Config source '{}' not found yet, will resolve lazily", name);
        }

        Ok(Self {
            name,
            locator,
            file: ArcSwapOption::new(file.map(Arc::new)),
            snapshot: ArcSwapOption::empty(),
            loaded: AtomicBool::new(false),
            listeners: ListenerRegistry::new(),
            reload_lock: Mutex::new(()),
            registration_lock: Mutex::new(()),
        })
    }

    /// Source name this store was created for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved backing file, if any
    pub fn file(&self) -> Option<PathBuf> {
        self.resolve_file().map(|file| file.to_path_buf())
    }

    /// Whether a reload has completed with all listeners notified
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Current snapshot, absent before the first load
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    /// Modification time of the backing file in milliseconds since the epoch, 0 if unresolved
    pub fn last_modified(&self) -> u64 {
        let Some(file) = self.resolve_file() else {
            return 0;
        };

        std::fs::metadata(file.as_path())
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Parse the source, install the new snapshot and notify listeners
    ///
    /// An unresolvable source is skipped. A parse failure keeps the previous
    /// snapshot. A listener failure stops the remaining listeners but keeps the
    /// newly installed snapshot.
    ///
    /// The reload lock is not reentrant: a listener must not call `reload` on
    /// the store that is notifying it, or the calling thread deadlocks.
    pub fn reload(&self) -> Result<()> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(file) = self.resolve_file() else {
            debug!("Config source '{}' not resolvable, skipping reload", self.name);
            return Ok(());
        };

        let properties = parse_file(&file).map_err(|source| {
            error!("Failed to load config '{}' from {}: {}", self.name, file.display(), source);
            ConfigError::ParseFailure {
                name: self.name.clone(),
                source,
            }
        })?;

        let snapshot = Snapshot::from_properties(properties);
        let entries = snapshot.len();
        self.snapshot.store(Some(Arc::new(snapshot)));
        info!("Config '{}' reloaded with {} entries", self.name, entries);

        let notified = self.execute_listeners()?;
        self.notify_late_listeners(notified)
    }

    /// Register a listener
    ///
    /// If the store is already loaded the listener runs once before this
    /// returns; if that run fails the listener is not registered.
    pub fn add_listener<L>(&self, listener: L) -> Result<()>
    where
        L: ConfigListener + 'static,
    {
        let listener: Arc<dyn ConfigListener> = Arc::new(listener);
        {
            let _registration = self.registration_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_loaded() {
                self.listeners.push(listener);
                return Ok(());
            }
        }

        self.execute_listener(listener.as_ref())?;
        self.listeners.push(listener);
        Ok(())
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run the listeners registered when the cycle started, returning how many ran
    fn execute_listeners(&self) -> Result<usize> {
        let listeners = self.listeners.snapshot();
        self.execute_range(&listeners, 0)?;
        debug!("Notified {} listeners of config '{}'", listeners.len(), self.name);
        Ok(listeners.len())
    }

    /// Catch up listeners appended after the cycle's view was taken, then mark
    /// the store loaded once no unnotified listener remains
    fn notify_late_listeners(&self, mut notified: usize) -> Result<()> {
        loop {
            let registration = self.registration_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let listeners = self.listeners.snapshot();
            if listeners.len() == notified {
                self.loaded.store(true, Ordering::Release);
                return Ok(());
            }
            drop(registration);

            debug!(
                "Notifying {} listeners registered during reload of config '{}'",
                listeners.len() - notified,
                self.name
            );
            self.execute_range(&listeners, notified)?;
            notified = listeners.len();
        }
    }

    fn execute_range(&self, listeners: &[Arc<dyn ConfigListener>], start: usize) -> Result<()> {
        for (index, listener) in listeners.iter().enumerate().skip(start) {
            if let Err(e) = self.execute_listener(listener.as_ref()) {
                error!("Listener #{} of config '{}' failed, skipping the rest", index, self.name);
                return Err(e);
            }
        }
        Ok(())
    }

    fn execute_listener(&self, listener: &dyn ConfigListener) -> Result<()> {
        listener
            .on_load(self)
            .map_err(|source| ConfigError::ListenerFailure {
                name: self.name.clone(),
                source,
            })
    }

    fn resolve_file(&self) -> Option<Arc<PathBuf>> {
        if let Some(file) = self.file.load_full() {
            return Some(file);
        }
        let file = Arc::new(self.locator.locate(&self.name)?);
        info!("Config source '{}' resolved to {}", self.name, file.display());
        self.file.store(Some(Arc::clone(&file)));
        Some(file)
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<String> {
        let current = self.snapshot.load();
        current
            .as_deref()
            .and_then(|snapshot| snapshot.get(key))
            .map(str::to_string)
    }

    pub fn exists(&self, key: &str) -> bool {
        let current = self.snapshot.load();
        current.as_deref().is_some_and(|snapshot| snapshot.contains_key(key))
    }

    /// Copy of the current snapshot
    pub fn to_map(&self) -> HashMap<String, String> {
        let current = self.snapshot.load();
        current.as_deref().map(Snapshot::to_map).unwrap_or_default()
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.required(key)
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.present(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_int(&self, key: &str) -> Result<i32> {
        parse_value(key, self.required(key)?, "int")
    }

    pub fn get_int_or(&self, key: &str, default: i32) -> Result<i32> {
        self.present(key)
            .map_or(Ok(default), |value| parse_value(key, value, "int"))
    }

    pub fn get_long(&self, key: &str) -> Result<i64> {
        parse_value(key, self.required(key)?, "long")
    }

    pub fn get_long_or(&self, key: &str, default: i64) -> Result<i64> {
        self.present(key)
            .map_or(Ok(default), |value| parse_value(key, value, "long"))
    }

    pub fn get_double(&self, key: &str) -> Result<f64> {
        parse_value(key, self.required(key)?, "double")
    }

    pub fn get_double_or(&self, key: &str, default: f64) -> Result<f64> {
        self.present(key)
            .map_or(Ok(default), |value| parse_value(key, value, "double"))
    }

    /// `true` only for "true" in any letter case
    pub fn get_boolean(&self, key: &str) -> Result<bool> {
        self.required(key).map(|value| parse_bool(&value))
    }

    pub fn get_boolean_or(&self, key: &str, default: bool) -> bool {
        self.present(key).map_or(default, |value| parse_bool(&value))
    }

    fn present(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !is_blank(value))
    }

    fn required(&self, key: &str) -> Result<String> {
        self.present(key)
            .ok_or_else(|| ConfigError::MissingOrBlankValue { key: key.to_string() })
    }
}

fn is_blank(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}

fn parse_value<T>(key: &str, value: String, expected: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| ConfigError::FormatError {
        key: key.to_string(),
        value,
        expected,
        source: Box::new(e),
    })
}
