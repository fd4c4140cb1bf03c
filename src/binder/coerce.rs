//! Coercion Engine
//!
//! Converts one string into the parameter type of a typed setter and invokes
//! it. The setter variant fixes the chain: int, long, boolean, string, double,
//! and finally a generic setter that receives either a factory-built instance
//! or the raw value.

use super::factory::{Instance, InstanceFactory};
use anyhow::{anyhow, Context, Result};
use std::any::Any;
use std::fmt;

/// Typed single-argument setter on `T`
pub enum Setter<T> {
    Int(fn(&mut T, i32)),
    Long(fn(&mut T, i64)),
    Bool(fn(&mut T, bool)),
    Str(fn(&mut T, String)),
    Double(fn(&mut T, f64)),
    Generic(fn(&mut T, GenericValue) -> Result<()>),
}

impl<T> Setter<T> {
    /// Parameter type name, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Setter::Int(_) => "int",
            Setter::Long(_) => "long",
            Setter::Bool(_) => "boolean",
            Setter::Str(_) => "string",
            Setter::Double(_) => "double",
            Setter::Generic(_) => "generic",
        }
    }

    /// Coerce `value` and pass it to the setter
    pub fn apply(&self, target: &mut T, value: &str, factory: &InstanceFactory) -> Result<()> {
        match self {
            Setter::Int(set) => set(target, parse_number(value, "int")?),
            Setter::Long(set) => set(target, parse_number(value, "long")?),
            Setter::Bool(set) => set(target, parse_bool(value)),
            Setter::Str(set) => set(target, value.to_string()),
            Setter::Double(set) => set(target, parse_number(value, "double")?),
            Setter::Generic(set) => return set(target, GenericValue::resolve(value, factory)?),
        }
        Ok(())
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Setter<T> {}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setter({})", self.kind())
    }
}

/// Argument of a generic setter
pub enum GenericValue {
    /// Built by the factory registered for the value's type name
    Instance(Instance),
    /// No factory registered, the value as written
    Raw(String),
}

impl GenericValue {
    fn resolve(value: &str, factory: &InstanceFactory) -> Result<Self> {
        match factory.construct(value) {
            Some(instance) => instance
                .map(GenericValue::Instance)
                .with_context(|| format!("failed to construct instance of {}", value)),
            None => Ok(GenericValue::Raw(value.to_string())),
        }
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, GenericValue::Instance(_))
    }

    /// Take the instance as `V`
    pub fn downcast<V: Any>(self) -> Result<V> {
        match self {
            GenericValue::Instance(instance) => instance
                .downcast::<V>()
                .map(|boxed| *boxed)
                .map_err(|_| anyhow!("instance is not a {}", std::any::type_name::<V>())),
            GenericValue::Raw(raw) => Err(anyhow!("no factory registered for '{}'", raw)),
        }
    }

    /// Raw value, if no instance was built
    pub fn into_raw(self) -> Option<String> {
        match self {
            GenericValue::Raw(raw) => Some(raw),
            GenericValue::Instance(_) => None,
        }
    }
}

impl fmt::Debug for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericValue::Instance(_) => f.write_str("Instance(..)"),
            GenericValue::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
        }
    }
}

/// `true` only for "true" in any letter case
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_number<N>(value: &str, expected: &str) -> Result<N>
where
    N: std::str::FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<N>()
        .with_context(|| format!("'{}' is not a valid {}", value, expected))
}
