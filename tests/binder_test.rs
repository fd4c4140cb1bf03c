//! Property Binder Integration Tests

use anyhow::Result;
use dynprops::binder::{GenericValue, InstanceFactory};
use dynprops::{bind, Bindable, ConfigError, PropertyBinder, PropertyTable, ResourceLocator};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
struct Codec {
    level: u8,
}

#[derive(Debug, Default)]
struct ClientOptions {
    host: String,
    port: i32,
    timeout_ms: i64,
    retry: bool,
    backoff: f64,
    codec: Option<Codec>,
    label: Option<String>,
}

impl Bindable for ClientOptions {
    fn describe(table: &mut PropertyTable<Self>) {
        table
            .string("setHost", |o, v| o.host = v)
            .int("setPort", |o, v| o.port = v)
            .long("setTimeoutMs", |o, v| o.timeout_ms = v)
            .boolean("isRetry", |o, v| o.retry = v)
            .double("setBackoff", |o, v| o.backoff = v)
            .generic("setCodec", |o, v| {
                o.codec = Some(v.downcast::<Codec>()?);
                Ok(())
            })
            .generic("setLabel", |o, v: GenericValue| {
                o.label = v.into_raw();
                Ok(())
            });
    }
}

fn codec_factory() -> InstanceFactory {
    let mut factory = InstanceFactory::new();
    factory.register("gzip", || Ok(Codec { level: 6 }));
    factory
}

#[test]
fn test_bind_every_setter_kind() -> Result<()> {
    let source = HashMap::from([
        ("host", "db.internal"),
        ("port", "5432"),
        ("timeoutMs", "30000"),
        ("retry", "TRUE"),
        ("backoff", "1.5"),
        ("codec", "gzip"),
        ("label", "primary"),
    ]);

    let mut options = ClientOptions::default();
    PropertyBinder::<ClientOptions>::new()
        .with_factory(codec_factory())
        .bind(&mut options, source, None)?;

    assert_eq!(options.host, "db.internal");
    assert_eq!(options.port, 5432);
    assert_eq!(options.timeout_ms, 30000);
    assert!(options.retry);
    assert_eq!(options.backoff, 1.5);
    assert_eq!(options.codec, Some(Codec { level: 6 }));
    assert_eq!(options.label.as_deref(), Some("primary"));
    Ok(())
}

#[test]
fn test_unrecognized_boolean_is_false() -> Result<()> {
    let options: ClientOptions = bind(
        ClientOptions {
            retry: true,
            ..Default::default()
        },
        [("retry", "yes")],
        None,
    )?;
    assert!(!options.retry);
    Ok(())
}

#[test]
fn test_prefix_is_stripped_only_where_present() -> Result<()> {
    let source = vec![
        ("client.host".to_string(), "a.example".to_string()),
        ("port".to_string(), "80".to_string()),
    ];
    let options = bind(ClientOptions::default(), source, Some("client."))?;
    assert_eq!(options.host, "a.example");
    assert_eq!(options.port, 80);
    Ok(())
}

#[test]
fn test_bind_stops_at_first_failure_in_key_order() {
    let source = HashMap::from([("host", "h"), ("port", "eighty"), ("retry", "true")]);
    let mut options = ClientOptions::default();

    let err = PropertyBinder::<ClientOptions>::new()
        .bind(&mut options, source, None)
        .unwrap_err();

    assert!(matches!(err, ConfigError::CoercionFailure { ref key, .. } if key == "port"));
    assert_eq!(options.host, "h");
    assert_eq!(options.port, 0);
    assert!(!options.retry);
}

#[test]
fn test_unknown_property_is_rejected() {
    let err = bind(ClientOptions::default(), [("colour", "blue")], None).unwrap_err();
    match err {
        ConfigError::UnresolvedProperty { key, .. } => assert_eq!(key, "colour"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_generic_without_factory_fails_downcast() {
    let err = bind(ClientOptions::default(), [("codec", "gzip")], None).unwrap_err();
    assert!(matches!(err, ConfigError::CoercionFailure { ref key, .. } if key == "codec"));
}

#[test]
fn test_bind_file_through_locator() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(
        temp_dir.path().join("client.properties"),
        "# client settings\nsvc.host = cache.local\nsvc.port = 6379\nsvc.retry = true\n",
    )?;
    let locator = ResourceLocator::new(vec![temp_dir.path().to_path_buf()]);

    let mut options = ClientOptions::default();
    PropertyBinder::<ClientOptions>::new().bind_file(
        &mut options,
        "client.properties",
        &locator,
        Some("svc."),
    )?;

    assert_eq!(options.host, "cache.local");
    assert_eq!(options.port, 6379);
    assert!(options.retry);
    Ok(())
}

#[test]
fn test_bind_file_missing_source() {
    let temp_dir = TempDir::new().unwrap();
    let locator = ResourceLocator::new(vec![temp_dir.path().to_path_buf()]);
    let mut options = ClientOptions::default();

    let err = PropertyBinder::<ClientOptions>::new()
        .bind_file(&mut options, "absent.properties", &locator, None)
        .unwrap_err();
    assert!(matches!(err, ConfigError::SourceNotFound { .. }));
}
