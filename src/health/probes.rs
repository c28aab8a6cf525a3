//! Built-in probes for the service's own subsystems.

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::dispatch::WorkerPool;
use crate::health::aggregator::HealthAggregator;
use crate::health::check::{probe_fn, HealthCheck, Probe, ProbeError, ProbeReport};

/// The process is up and serving.
pub fn app_check() -> HealthCheck {
    HealthCheck::new(
        "app",
        probe_fn(|| async { Ok(ProbeReport::healthy_with("operational")) }),
    )
}

/// Reports whether the metrics exporter is configured.
pub fn observability_check(metrics_enabled: bool) -> HealthCheck {
    HealthCheck::new(
        "observability",
        probe_fn(move || async move {
            if metrics_enabled {
                Ok(ProbeReport::healthy_with("configured"))
            } else {
                Ok(ProbeReport::healthy_with("metrics exporter disabled"))
            }
        }),
    )
}

/// Worker pool availability.
pub struct WorkerPoolProbe {
    pool: Arc<WorkerPool>,
}

impl WorkerPoolProbe {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }
}

impl Probe for WorkerPoolProbe {
    fn check(&self) -> BoxFuture<'_, Result<ProbeReport, ProbeError>> {
        Box::pin(async move {
            if self.pool.is_closed() {
                return Err(ProbeError::Unavailable {
                    subsystem: "worker pool".to_string(),
                    reason: "shut down".to_string(),
                });
            }

            let occupancy = self.pool.occupancy();
            if self.pool.is_saturated() {
                Ok(ProbeReport::degraded(format!(
                    "all {} workers busy",
                    occupancy.size
                )))
            } else {
                Ok(ProbeReport::healthy_with(format!(
                    "{}/{} workers busy",
                    occupancy.size - occupancy.available,
                    occupancy.size
                )))
            }
        })
    }
}

pub fn worker_pool_check(pool: Arc<WorkerPool>) -> HealthCheck {
    HealthCheck::new("worker_pool", WorkerPoolProbe::new(pool))
}

/// The checks served on `/health`.
pub fn default_aggregator(config: &ServiceConfig, pool: Arc<WorkerPool>) -> HealthAggregator {
    HealthAggregator::new()
        .with_check(app_check())
        .with_check(observability_check(config.observability.metrics_enabled))
        .with_check(worker_pool_check(pool))
}
