//! dynprops Library
//!
//! Hot-reloadable `.properties` configuration and naming-convention property
//! binding.
//!
//! - [`dynamic`]: a store holding an immutable snapshot of one source, typed
//!   getters, serialized reloads and listener notification
//! - [`binder`]: one-shot population of a target through a table of typed
//!   setters, with a fixed coercion chain
//! - [`properties`]: parsing, locating and loading of sources
//! - [`config`]: settings for this crate

pub mod binder;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod properties;

pub use binder::{bind, Bindable, PropertyBinder, PropertyTable};
pub use config::{Settings, SettingsManager};
pub use dynamic::{ConfigListener, DynamicConfig, DynamicConfigManager};
pub use error::ConfigError;
pub use properties::ResourceLocator;

/// Common result type for the library
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
