//! Property Binder
//!
//! Applies a key/value source to a target through its property table.
//! Keys are processed in ascending order of the source key, before prefix
//! stripping. The first failing key aborts the bind, so every key ordered
//! before it has been applied and none after it.

use super::coerce::Setter;
use super::factory::InstanceFactory;
use super::table::{Bindable, PropertyTable};
use crate::error::ConfigError;
use crate::properties::{load_properties, ResourceLocator};
use crate::Result;
use tracing::{debug, info};

/// Reusable binder for one target type
#[derive(Debug)]
pub struct PropertyBinder<T> {
    table: PropertyTable<T>,
    factory: InstanceFactory,
}

impl<T: Bindable> PropertyBinder<T> {
    /// Create a binder from the type's own table
    pub fn new() -> Self {
        Self::with_table(T::property_table())
    }
}

impl<T: Bindable> Default for PropertyBinder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PropertyBinder<T> {
    /// Create a binder over an explicit table
    pub fn with_table(table: PropertyTable<T>) -> Self {
        Self {
            table,
            factory: InstanceFactory::new(),
        }
    }

    /// Use `factory` for generic setters
    pub fn with_factory(mut self, factory: InstanceFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn table(&self) -> &PropertyTable<T> {
        &self.table
    }

    /// Bind every entry of `source` onto `target`
    pub fn bind<I, K, V>(&self, target: &mut T, source: I, ignored_prefix: Option<&str>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: Vec<(K, V)> = source.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));

        for (key, value) in &entries {
            let key = key.as_ref();
            let property = match ignored_prefix {
                Some(prefix) => key.strip_prefix(prefix).unwrap_or(key),
                None => key,
            };
            self.bind_property(target, property, value.as_ref())?;
        }

        info!("Bound {} properties onto {}", entries.len(), self.table.type_name());
        Ok(())
    }

    /// Load a properties source and bind it onto `target`
    pub fn bind_file(
        &self,
        target: &mut T,
        name: &str,
        locator: &ResourceLocator,
        ignored_prefix: Option<&str>,
    ) -> Result<()> {
        let properties = load_properties(name, locator)?;
        self.bind(target, properties, ignored_prefix)
    }

    fn bind_property(&self, target: &mut T, property: &str, value: &str) -> Result<()> {
        let setter = self.resolve(property).ok_or_else(|| ConfigError::UnresolvedProperty {
            key: property.to_string(),
            target: self.table.type_name(),
        })?;

        setter
            .apply(target, value, &self.factory)
            .map_err(|source| ConfigError::CoercionFailure {
                key: property.to_string(),
                target: self.table.type_name(),
                source,
            })?;

        debug!("Set {} property '{}' on {}", setter.kind(), property, self.table.type_name());
        Ok(())
    }

    /// `set` + capitalized name, then the boolean `is` convention
    fn resolve(&self, property: &str) -> Option<Setter<T>> {
        let mut chars = property.chars();
        let first = chars.next()?;
        let capitalized: String = first.to_uppercase().chain(chars).collect();

        self.table
            .find(&format!("set{}", capitalized))
            .or_else(|| self.table.find(&format!("is{}", capitalized)))
    }
}

/// Bind `source` onto an owned target and return it
pub fn bind<T, I, K, V>(mut target: T, source: I, ignored_prefix: Option<&str>) -> Result<T>
where
    T: Bindable,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    PropertyBinder::<T>::new().bind(&mut target, source, ignored_prefix)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::GenericValue;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct ServerSettings {
        port: i32,
        retry: bool,
        name: String,
        codec: Option<String>,
    }

    impl Bindable for ServerSettings {
        fn describe(table: &mut PropertyTable<Self>) {
            table
                .int("setPort", |s, v| s.port = v)
                .boolean("isRetry", |s, v| s.retry = v)
                .string("setName", |s, v| s.name = v)
                .generic("setCodec", |s, v| {
                    s.codec = v.into_raw();
                    Ok(())
                });
        }
    }

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_bind_with_is_convention() {
        let settings = bind(
            ServerSettings::default(),
            source(&[("port", "8080"), ("retry", "true")]),
            None,
        )
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert!(settings.retry);
    }

    #[test]
    fn test_fail_fast_in_key_order() {
        let binder = PropertyBinder::<ServerSettings>::new();
        let mut settings = ServerSettings::default();

        let err = binder
            .bind(
                &mut settings,
                source(&[("retry", "true"), ("port", "not-a-number"), ("name", "edge")]),
                None,
            )
            .unwrap_err();

        assert!(matches!(err, ConfigError::CoercionFailure { ref key, .. } if key == "port"));
        assert_eq!(settings.name, "edge");
        assert!(!settings.retry);
    }

    #[test]
    fn test_prefix_stripping() {
        let binder = PropertyBinder::<ServerSettings>::new();
        let mut prefixed = ServerSettings::default();
        let mut plain = ServerSettings::default();

        binder.bind(&mut prefixed, source(&[("app.port", "9090")]), Some("app.")).unwrap();
        binder.bind(&mut plain, source(&[("port", "9090")]), None).unwrap();

        assert_eq!(prefixed.port, 9090);
        assert_eq!(prefixed.port, plain.port);
    }

    #[test]
    fn test_unresolved_property() {
        let err = bind(ServerSettings::default(), source(&[("timeout", "5")]), None).unwrap_err();
        match err {
            ConfigError::UnresolvedProperty { key, target } => {
                assert_eq!(key, "timeout");
                assert!(target.ends_with("ServerSettings"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_property_name_is_unresolved() {
        let err = bind(ServerSettings::default(), source(&[("app.", "x")]), Some("app.")).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedProperty { .. }));
    }

    #[test]
    fn test_generic_factory_failure_is_coercion_failure() {
        let mut factory = InstanceFactory::new();
        factory.register::<String, _>("codec.Gzip", || anyhow::bail!("codec unavailable"));
        let binder = PropertyBinder::<ServerSettings>::new().with_factory(factory);
        let mut settings = ServerSettings::default();

        let err = binder
            .bind(&mut settings, source(&[("codec", "codec.Gzip")]), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::CoercionFailure { .. }));

        binder.bind(&mut settings, source(&[("codec", "identity")]), None).unwrap();
        assert_eq!(settings.codec.as_deref(), Some("identity"));
    }

    #[test]
    fn test_generic_instance_downcast() {
        #[derive(Default)]
        struct Holder {
            list: Vec<String>,
        }
        let mut table = PropertyTable::<Holder>::new();
        table.generic("setList", |h, v: GenericValue| {
            h.list = v.downcast::<Vec<String>>()?;
            Ok(())
        });

        let mut factory = InstanceFactory::new();
        factory.register("std.Vec", || Ok(vec!["seed".to_string()]));
        let binder = PropertyBinder::with_table(table).with_factory(factory);

        let mut holder = Holder::default();
        binder.bind(&mut holder, [("list", "std.Vec")], None).unwrap();
        assert_eq!(holder.list, vec!["seed".to_string()]);
    }
}
