//! Instance Factory
//!
//! Last step of the coercion chain: a value bound to a generic setter is looked
//! up as a type name here. Registered names produce a fresh instance, unknown
//! names fall through to the raw string.

use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased instance produced by a factory
pub type Instance = Box<dyn Any + Send>;

type Constructor = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// Constructors keyed by type name
#[derive(Clone, Default)]
pub struct InstanceFactory {
    constructors: HashMap<String, Constructor>,
}

impl InstanceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `type_name`
    pub fn register<V, F>(&mut self, type_name: impl Into<String>, constructor: F) -> &mut Self
    where
        V: Any + Send,
        F: Fn() -> Result<V> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move || constructor().map(|value| Box::new(value) as Instance));
        self.constructors.insert(type_name.into(), constructor);
        self
    }

    /// Register `V::default` under `type_name`
    pub fn register_default<V>(&mut self, type_name: impl Into<String>) -> &mut Self
    where
        V: Any + Send + Default,
    {
        self.register(type_name, || Ok(V::default()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Build an instance of `type_name`, `None` if nothing is registered for it
    pub fn construct(&self, type_name: &str) -> Option<Result<Instance>> {
        self.constructors.get(type_name).map(|constructor| constructor())
    }
}

impl fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("InstanceFactory").field("types", &names).finish()
    }
}
