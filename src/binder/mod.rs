//! Binder Module
//!
//! Populates target values from key/value sources by setter naming convention.

#[allow(clippy::module_inception)]
pub mod binder;
pub mod coerce;
pub mod factory;
pub mod table;

pub use binder::{bind, PropertyBinder};
pub use coerce::{GenericValue, Setter};
pub use factory::{Instance, InstanceFactory};
pub use table::{Bindable, PropertyTable};
