//! Dynamic Config Manager
//!
//! Caches one store per source name and decides, from modification times,
//! which stores need a reload.

use super::DynamicConfig;
use crate::config::Settings;
use crate::properties::ResourceLocator;
use crate::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

struct TrackedConfig {
    config: Arc<DynamicConfig>,
    last_seen: AtomicU64,
}

/// Registry of dynamic configs sharing one locator
pub struct DynamicConfigManager {
    locator: ResourceLocator,
    fail_on_missing: bool,
    configs: Mutex<HashMap<String, Arc<TrackedConfig>>>,
}

impl DynamicConfigManager {
    /// Create a new manager
    pub fn new(locator: ResourceLocator, fail_on_missing: bool) -> Self {
        Self {
            locator,
            fail_on_missing,
            configs: Mutex::new(HashMap::new()),
        }
    }

    /// Create a manager from crate settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.locator(), settings.source.fail_on_missing)
    }

    /// Get the store for `name`, creating and loading it on first use
    pub fn load(&self, name: &str) -> Result<Arc<DynamicConfig>> {
        let mut configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tracked) = configs.get(name) {
            return Ok(Arc::clone(&tracked.config));
        }

        let config = Arc::new(DynamicConfig::new(name, self.locator.clone(), self.fail_on_missing)?);
        let modified = config.last_modified();
        config.reload()?;

        info!("Registered dynamic config '{}'", name);
        configs.insert(
            name.to_string(),
            Arc::new(TrackedConfig {
                config: Arc::clone(&config),
                last_seen: AtomicU64::new(modified),
            }),
        );
        Ok(config)
    }

    /// Registered store for `name`
    pub fn get(&self, name: &str) -> Option<Arc<DynamicConfig>> {
        let configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        configs.get(name).map(|tracked| Arc::clone(&tracked.config))
    }

    /// Names of all registered stores
    pub fn names(&self) -> Vec<String> {
        let configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = configs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Backing files of all registered stores that currently resolve
    pub fn watched_files(&self) -> Vec<PathBuf> {
        self.tracked().iter().filter_map(|tracked| tracked.config.file()).collect()
    }

    /// Reload every store whose backing file changed since it was last seen
    ///
    /// A failed reload is logged and the store keeps its previous snapshot;
    /// it is retried on the next modification. Returns the number of stores
    /// reloaded successfully.
    pub fn check_for_changes(&self) -> usize {
        let mut reloaded = 0;

        for tracked in self.tracked() {
            let modified = tracked.config.last_modified();
            // Claim the change so concurrent triggers reload it only once
            if modified == 0 || tracked.last_seen.swap(modified, Ordering::AcqRel) == modified {
                continue;
            }

            debug!("Config '{}' modified at {}, reloading", tracked.config.name(), modified);
            match tracked.config.reload() {
                Ok(()) => reloaded += 1,
                Err(e) => error!(
                    "Failed to reload config '{}', keeping current snapshot: {:#}",
                    tracked.config.name(),
                    anyhow::Error::from(e)
                ),
            }
        }

        reloaded
    }

    fn tracked(&self) -> Vec<Arc<TrackedConfig>> {
        let configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        configs.values().cloned().collect()
    }
}
