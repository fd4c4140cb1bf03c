//! Settings Types

use crate::properties::ResourceLocator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Crate settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub reload: ReloadSettings,
    pub logging: LoggingSettings,
}

/// Source resolution settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directories searched for resource names; empty means the environment default
    pub resource_roots: Vec<PathBuf>,
    pub fail_on_missing: bool,
}

/// Reload trigger settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadSettings {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub watch_files: bool,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Settings {
    /// Locator over the configured roots
    pub fn locator(&self) -> ResourceLocator {
        if self.source.resource_roots.is_empty() {
            ResourceLocator::from_env()
        } else {
            ResourceLocator::new(self.source.resource_roots.clone())
        }
    }
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            watch_files: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
