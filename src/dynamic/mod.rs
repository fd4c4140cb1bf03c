//! Dynamic Configuration Module
//!
//! Hot-reloadable properties sources with listener notification.

pub mod listener;
pub mod manager;
pub mod snapshot;
pub mod store;
pub mod watcher;

pub use listener::{ConfigListener, ListenerRegistry};
pub use manager::DynamicConfigManager;
pub use snapshot::Snapshot;
pub use store::DynamicConfig;
pub use watcher::{spawn_poller, ConfigWatcher};
