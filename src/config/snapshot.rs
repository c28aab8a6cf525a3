//! Versioned configuration snapshots.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::config::schema::ServiceConfig;

/// An immutable configuration together with its publication number.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub config: ServiceConfig,
}

/// Shared handle to the current snapshot.
///
/// Readers take an `Arc` of the snapshot and keep it for as long as they need
/// it; a later publication never changes a snapshot already taken.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<ConfigSnapshot>>,
}

impl SharedConfig {
    /// Start at version 1.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ConfigSnapshot { version: 1, config })),
        }
    }

    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.inner.load_full()
    }

    /// Replace the current configuration. Returns the new version.
    pub fn publish(&self, config: ServiceConfig) -> u64 {
        let previous = self.inner.rcu(|current| ConfigSnapshot {
            version: current.version + 1,
            config: config.clone(),
        });
        previous.version + 1
    }
}
