//! dynprops - Hot-reloadable properties files
//!
//! Command-line front end for inspecting and watching `.properties` sources.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynprops::{
    dynamic::{spawn_poller, ConfigWatcher},
    properties::load_properties,
    DynamicConfig, DynamicConfigManager, Settings, SettingsManager,
};

/// CLI arguments for dynprops
#[derive(Parser, Debug)]
#[command(name = "dynprops")]
#[command(about = "dynprops - Hot-reloadable properties files")]
#[command(version)]
#[command(long_about = "
dynprops - Hot-reloadable properties files

Settings priority (highest to lowest):
1. Command-line arguments
2. Settings file
3. Environment variables
4. Built-in defaults

Environment variables:
  DYNPROPS_RESOURCE_PATH   - Default resource roots (platform path list)
  DYNPROPS_RESOURCE_ROOTS  - Resource roots override (platform path list)
  DYNPROPS_FAIL_ON_MISSING - Fail when a source cannot be found (true/false)
  DYNPROPS_POLL_INTERVAL   - Poll interval (e.g., 5s, 500ms)
  DYNPROPS_WATCH_FILES     - Also use filesystem events (true/false)
  DYNPROPS_LOG_LEVEL       - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Settings file path
    #[arg(
        short,
        long,
        default_value = "dynprops.toml",
        help = "Path to settings file"
    )]
    pub settings: PathBuf,

    /// Resource roots (overrides settings file)
    #[arg(short, long = "root", help = "Resource root directory, may be repeated")]
    pub roots: Vec<PathBuf>,

    /// Log level (overrides settings file)
    #[arg(long, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the parsed properties of a source
    Dump {
        /// File path or resource name
        name: String,

        /// Print as JSON instead of key=value lines
        #[arg(long)]
        json: bool,
    },
    /// Load a source and log every reload until interrupted
    Watch {
        /// File path or resource name
        name: String,

        /// Poll interval (e.g., 5s, 500ms)
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,

        /// Fail if the source does not exist yet
        #[arg(long)]
        fail_on_missing: bool,

        /// Also reload on filesystem events
        #[arg(long)]
        watch_files: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Settings priority: CLI args > settings file > environment > defaults
    let mut settings = SettingsManager::load(&args.settings)?;

    init_tracing(&args, &settings)?;

    info!("Starting dynprops v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Dump { name, json } => {
            settings.merge_with_cli_args(&args.roots, None, false, false);
            dump(&settings, &name, json)
        }
        Command::Watch {
            name,
            interval,
            fail_on_missing,
            watch_files,
        } => {
            settings.merge_with_cli_args(&args.roots, interval, fail_on_missing, watch_files);
            settings
                .validate()
                .context("Final settings validation failed")?;
            watch(settings, &name).await
        }
    }
}

fn dump(settings: &Settings, name: &str, json: bool) -> Result<()> {
    let properties = load_properties(name, &settings.locator())
        .with_context(|| format!("Failed to load {}", name))?;
    let sorted: BTreeMap<String, String> = properties.into_iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&sorted)?);
    } else {
        for (key, value) in &sorted {
            println!("{}={}", key, value);
        }
    }
    Ok(())
}

async fn watch(settings: Settings, name: &str) -> Result<()> {
    let manager = Arc::new(DynamicConfigManager::from_settings(&settings));
    let config = manager
        .load(name)
        .with_context(|| format!("Failed to load {}", name))?;

    config.add_listener(|config: &DynamicConfig| -> anyhow::Result<()> {
        info!("Config '{}' now holds {} entries", config.name(), config.to_map().len());
        Ok(())
    })?;

    if !config.is_loaded() {
        warn!("Source '{}' not found yet, waiting for it to appear", name);
    }

    let poller = spawn_poller(Arc::clone(&manager), settings.reload.poll_interval);

    let _watcher = if settings.reload.watch_files {
        match ConfigWatcher::new(Arc::clone(&manager)) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                error!("Filesystem watching disabled: {:#}", anyhow::Error::from(e));
                None
            }
        }
    } else {
        None
    };

    info!("Watching '{}', press Ctrl+C to stop", name);
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    poller.abort();
    info!("Stopped watching '{}'", name);
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs, settings: &Settings) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_deref().unwrap_or(&settings.logging.log_level)
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    Ok(())
}
