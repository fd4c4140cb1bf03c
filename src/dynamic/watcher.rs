//! Reload Triggers
//!
//! Two ways of driving [`DynamicConfigManager::check_for_changes`]: a tokio
//! interval poller and a `notify` filesystem watcher. Both tolerate reload
//! failures and keep running.

use super::DynamicConfigManager;
use crate::error::ConfigError;
use crate::Result;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Poll all managed configs on a fixed interval
pub fn spawn_poller(manager: Arc<DynamicConfigManager>, interval: Duration) -> JoinHandle<()> {
    info!("Starting config poller with interval {:?}", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let manager = Arc::clone(&manager);
            match tokio::task::spawn_blocking(move || manager.check_for_changes()).await {
                Ok(0) => {}
                Ok(reloaded) => debug!("Poller reloaded {} configs", reloaded),
                Err(e) => error!("Config poll task failed: {}", e),
            }
        }
    })
}

/// Filesystem watcher over the directories of managed config files
pub struct ConfigWatcher {
    watched_dirs: BTreeSet<PathBuf>,
    watcher_handle: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Create a watcher over every config the manager currently resolves
    pub fn new(manager: Arc<DynamicConfigManager>) -> Result<Self> {
        let handler_manager = Arc::clone(&manager);
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => Self::handle_file_event(event, &handler_manager),
                Err(e) => error!("File watcher error: {}", e),
            },
            NotifyConfig::default(),
        )
        .map_err(|source| ConfigError::Watch {
            path: PathBuf::new(),
            source,
        })?;

        let mut config_watcher = Self {
            watched_dirs: BTreeSet::new(),
            watcher_handle: watcher,
        };

        for file in manager.watched_files() {
            config_watcher.watch_file(&file)?;
        }

        Ok(config_watcher)
    }

    /// Start watching the directory containing `file`
    ///
    /// The parent directory is watched because editors often replace files
    /// instead of writing them in place.
    pub fn watch_file(&mut self, file: &Path) -> Result<()> {
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if self.watched_dirs.contains(&dir) {
            return Ok(());
        }

        self.watcher_handle
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| ConfigError::Watch {
                path: dir.clone(),
                source,
            })?;
        info!("Started watching configuration directory: {}", dir.display());
        self.watched_dirs.insert(dir);
        Ok(())
    }

    /// Directories currently watched
    pub fn watched_dirs(&self) -> impl Iterator<Item = &Path> {
        self.watched_dirs.iter().map(PathBuf::as_path)
    }

    fn handle_file_event(event: Event, manager: &DynamicConfigManager) {
        debug!("File event: {:?}", event);

        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            if matches!(event.kind, EventKind::Remove(_)) {
                warn!("Watched file removed: {:?}", event.paths);
            }
            return;
        }

        let watched = manager.watched_files();
        let affects_config = event.paths.iter().any(|path| {
            watched
                .iter()
                .any(|file| path.file_name().is_some() && path.file_name() == file.file_name())
        });
        if !affects_config {
            return;
        }

        let reloaded = manager.check_for_changes();
        if reloaded > 0 {
            info!("Reloaded {} configs after file change", reloaded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynamicConfig;
    use crate::properties::ResourceLocator;
    use notify::event::{AccessKind, DataChange, ModifyKind, RemoveKind};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::SystemTime;
    use tempfile::TempDir;
    use tokio::time::sleep;

    /// Write `content` through a rename with an mtime in the future
    fn replace_file(path: &Path, content: &str) {
        let staging = path.with_extension("staging");
        fs::write(&staging, content).unwrap();
        fs::File::options()
            .write(true)
            .open(&staging)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        fs::rename(&staging, path).unwrap();
    }

    fn counting_listener(config: &DynamicConfig) -> Arc<AtomicUsize> {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        config
            .add_listener(move |_: &DynamicConfig| -> anyhow::Result<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        seen
    }

    #[tokio::test]
    async fn test_poller_picks_up_late_file() {
        let dir = TempDir::new().unwrap();
        let manager = Arc::new(DynamicConfigManager::new(
            ResourceLocator::new(vec![dir.path().to_path_buf()]),
            false,
        ));
        let config = manager.load("poll.properties").unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        config
            .add_listener(move |_: &DynamicConfig| -> anyhow::Result<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let handle = spawn_poller(Arc::clone(&manager), Duration::from_millis(20));
        let staging = dir.path().join("poll.staging");
        fs::write(&staging, "ready=true").unwrap();
        fs::rename(&staging, dir.path().join("poll.properties")).unwrap();

        for _ in 0..100 {
            if config.is_loaded() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(config.get_boolean("ready").unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watcher_watches_parent_dirs_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.properties"), "a=1").unwrap();
        fs::write(dir.path().join("b.properties"), "b=1").unwrap();
        let manager = Arc::new(DynamicConfigManager::new(
            ResourceLocator::new(vec![dir.path().to_path_buf()]),
            true,
        ));
        manager.load("a.properties").unwrap();
        manager.load("b.properties").unwrap();

        let watcher = ConfigWatcher::new(manager).unwrap();
        assert_eq!(watcher.watched_dirs().count(), 1);
    }

    #[test]
    fn test_events_filtered_by_kind_and_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.properties");
        fs::write(&path, "k=1").unwrap();
        let manager = DynamicConfigManager::new(ResourceLocator::new(vec![dir.path().to_path_buf()]), true);
        let config = manager.load("a.properties").unwrap();
        let seen = counting_listener(&config);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        replace_file(&path, "k=2");

        let modify = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        ConfigWatcher::handle_file_event(
            Event::new(modify).add_path(dir.path().join("unrelated.txt")),
            &manager,
        );
        ConfigWatcher::handle_file_event(
            Event::new(EventKind::Access(AccessKind::Any)).add_path(path.clone()),
            &manager,
        );
        ConfigWatcher::handle_file_event(
            Event::new(EventKind::Remove(RemoveKind::File)).add_path(path.clone()),
            &manager,
        );
        assert_eq!(config.get_int("k").unwrap(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        ConfigWatcher::handle_file_event(Event::new(modify).add_path(path.clone()), &manager);
        assert_eq!(config.get_int("k").unwrap(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_watcher_reloads_on_file_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watched.properties");
        fs::write(&path, "k=1").unwrap();
        let manager = Arc::new(DynamicConfigManager::new(
            ResourceLocator::new(vec![dir.path().to_path_buf()]),
            true,
        ));
        let config = manager.load("watched.properties").unwrap();
        let _watcher = ConfigWatcher::new(Arc::clone(&manager)).unwrap();

        // Give the backend time to register the watch
        sleep(Duration::from_millis(100)).await;
        replace_file(&path, "k=2");

        for _ in 0..150 {
            if config.get_int("k").unwrap() == 2 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(config.get_int("k").unwrap(), 2);
    }
}
