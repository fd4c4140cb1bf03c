//! Property Tables
//!
//! A table maps setter names such as `setPort` or `isRetry` to typed setters.
//! It replaces runtime member discovery: each bindable type describes its
//! setters once and the table is reused for every bind.

use super::coerce::{GenericValue, Setter};
use std::collections::HashMap;
use std::fmt;

/// Types that can describe their own setters
pub trait Bindable: Sized {
    fn describe(table: &mut PropertyTable<Self>);

    /// Build the table for this type
    fn property_table() -> PropertyTable<Self> {
        let mut table = PropertyTable::new();
        Self::describe(&mut table);
        table
    }
}

/// Setter names to typed setters for one target type
pub struct PropertyTable<T> {
    type_name: &'static str,
    setters: HashMap<String, Setter<T>>,
}

impl<T> PropertyTable<T> {
    pub fn new() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            setters: HashMap::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Add a setter under its full name
    pub fn setter(&mut self, name: impl Into<String>, setter: Setter<T>) -> &mut Self {
        self.setters.insert(name.into(), setter);
        self
    }

    pub fn int(&mut self, name: &str, set: fn(&mut T, i32)) -> &mut Self {
        self.setter(name, Setter::Int(set))
    }

    pub fn long(&mut self, name: &str, set: fn(&mut T, i64)) -> &mut Self {
        self.setter(name, Setter::Long(set))
    }

    pub fn boolean(&mut self, name: &str, set: fn(&mut T, bool)) -> &mut Self {
        self.setter(name, Setter::Bool(set))
    }

    pub fn string(&mut self, name: &str, set: fn(&mut T, String)) -> &mut Self {
        self.setter(name, Setter::Str(set))
    }

    pub fn double(&mut self, name: &str, set: fn(&mut T, f64)) -> &mut Self {
        self.setter(name, Setter::Double(set))
    }

    pub fn generic(&mut self, name: &str, set: fn(&mut T, GenericValue) -> anyhow::Result<()>) -> &mut Self {
        self.setter(name, Setter::Generic(set))
    }

    /// Setter registered under exactly `name`
    pub fn find(&self, name: &str) -> Option<Setter<T>> {
        self.setters.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }
}

impl<T> Default for PropertyTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PropertyTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.setters.keys().collect();
        names.sort();
        f.debug_struct("PropertyTable")
            .field("type_name", &self.type_name)
            .field("setters", &names)
            .finish()
    }
}
