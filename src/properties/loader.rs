//! Properties Loader

use super::{parse_file, Properties, ResourceLocator};
use crate::error::ConfigError;
use crate::Result;
use tracing::info;

/// Load a properties source by file path or resource name
pub fn load_properties(name: &str, locator: &ResourceLocator) -> Result<Properties> {
    let path = locator
        .locate(name)
        .ok_or_else(|| ConfigError::SourceNotFound { name: name.to_string() })?;

    let properties = parse_file(&path).map_err(|source| ConfigError::ParseFailure {
        name: name.to_string(),
        source,
    })?;

    info!("Loaded {} properties from {}", properties.len(), path.display());
    Ok(properties)
}

/// Independent copy of a property map
pub fn copy_properties(properties: &Properties) -> Properties {
    properties.clone()
}
