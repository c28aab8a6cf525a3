//! Configuration file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::loader::{load_config, ConfigError};
use crate::config::snapshot::SharedConfig;

/// What a reload attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot was published under this version.
    Published(u64),
    /// The file parsed to the configuration already in use.
    Unchanged,
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    shared: SharedConfig,
}

impl ConfigWatcher {
    pub fn new(path: &Path, shared: SharedConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            shared,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for reloads to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let shared = self.shared.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        if let Err(e) = reload(&path, &shared) {
                            tracing::error!(
                                "Failed to reload config: {}. Keeping current configuration.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load `path` and publish it if it differs from the current snapshot.
///
/// The worker pool is sized once at start; a changed `dispatch.pool_size` is
/// published but has no effect until restart.
pub fn reload(path: &Path, shared: &SharedConfig) -> Result<ReloadOutcome, ConfigError> {
    let config = load_config(path)?;
    let current = shared.current();

    if config == current.config {
        return Ok(ReloadOutcome::Unchanged);
    }

    if config.dispatch.pool_size != current.config.dispatch.pool_size {
        tracing::warn!(
            running = current.config.dispatch.pool_size,
            configured = config.dispatch.pool_size,
            "dispatch.pool_size changed; takes effect after restart"
        );
    }

    let version = shared.publish(config);
    tracing::info!(version, "Configuration reloaded");
    Ok(ReloadOutcome::Published(version))
}
