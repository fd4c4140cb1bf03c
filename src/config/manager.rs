//! Settings Manager

use super::Settings;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "DYNPROPS_";

/// Manages settings loading and validation
pub struct SettingsManager;

impl SettingsManager {
    /// Load settings with the full priority chain: settings file over
    /// `DYNPROPS_` environment variables over defaults
    pub fn load(path: &Path) -> Result<Settings> {
        Self::load_layered(path, env_lookup)
    }

    /// Load settings from a TOML file, ignoring the environment
    pub fn load_from_file(path: &Path) -> Result<Settings> {
        Self::load_layered(path, |_| None)
    }

    /// Overlay the TOML file at `path`, if present, on defaults overridden by `lookup`
    ///
    /// Only the keys written in the file replace environment values.
    pub fn load_layered<F>(path: &Path, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        settings.apply_env(lookup)?;

        if path.exists() {
            tracing::info!("Loading settings from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

            let file: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

            let mut merged = match toml::Value::try_from(&settings).context("Failed to serialize settings")? {
                toml::Value::Table(table) => table,
                other => bail!("Settings serialized to a {} instead of a table", other.type_str()),
            };
            overlay(&mut merged, file);
            settings = toml::Value::Table(merged)
                .try_into()
                .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

            settings.validate().with_context(|| "Settings validation failed")?;
            tracing::info!("Settings loaded and validated successfully");
        } else {
            tracing::warn!(
                "Settings file not found at {}, using environment and defaults",
                path.display()
            );
            settings.validate()?;
        }

        Ok(settings)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

/// Replace values in `base` with those of `file`, descending into tables
fn overlay(base: &mut toml::Table, file: toml::Table) {
    for (key, value) in file {
        if let toml::Value::Table(nested) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                overlay(existing, nested);
                continue;
            }
            base.insert(key, toml::Value::Table(nested));
        } else {
            base.insert(key, value);
        }
    }
}

impl Settings {
    /// Override fields from `lookup`, keyed by the variable name without prefix
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(roots) = lookup("RESOURCE_ROOTS") {
            self.source.resource_roots = std::env::split_paths(&roots).collect();
        }

        if let Some(fail) = lookup("FAIL_ON_MISSING") {
            self.source.fail_on_missing = fail
                .parse::<bool>()
                .with_context(|| format!("Invalid {}FAIL_ON_MISSING: {}", ENV_PREFIX, fail))?;
        }

        if let Some(interval) = lookup("POLL_INTERVAL") {
            self.reload.poll_interval = humantime::parse_duration(&interval)
                .with_context(|| format!("Invalid {}POLL_INTERVAL: {}", ENV_PREFIX, interval))?;
        }

        if let Some(watch) = lookup("WATCH_FILES") {
            self.reload.watch_files = watch
                .parse::<bool>()
                .with_context(|| format!("Invalid {}WATCH_FILES: {}", ENV_PREFIX, watch))?;
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.logging.log_level = log_level;
        }

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.reload.poll_interval < Duration::from_millis(10) {
            bail!("reload.poll_interval must be at least 10ms");
        }

        if self.reload.poll_interval > Duration::from_secs(24 * 3600) {
            bail!("reload.poll_interval cannot exceed 24 hours");
        }

        for (i, root) in self.source.resource_roots.iter().enumerate() {
            if root.as_os_str().is_empty() {
                bail!("source.resource_roots entry {} is empty", i);
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.log_level.as_str()) {
            bail!("logging.log_level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        resource_roots: &[PathBuf],
        poll_interval: Option<Duration>,
        fail_on_missing: bool,
        watch_files: bool,
    ) {
        if !resource_roots.is_empty() {
            self.source.resource_roots = resource_roots.to_vec();
            tracing::info!("CLI override: resource roots set to {:?}", resource_roots);
        }

        if let Some(interval) = poll_interval {
            self.reload.poll_interval = interval;
            tracing::info!("CLI override: poll interval set to {:?}", interval);
        }

        if fail_on_missing {
            self.source.fail_on_missing = true;
            tracing::info!("CLI override: fail on missing source enabled");
        }

        if watch_files {
            self.reload.watch_files = true;
            tracing::info!("CLI override: filesystem watching enabled");
        }
    }
}
