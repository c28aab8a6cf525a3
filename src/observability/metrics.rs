//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, checks, dispatches, resolver usage)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): request latency
//! - `health_check_duration_seconds` (histogram): per-check latency
//! - `health_check_status` (gauge): per-check state rank, 0=healthy 2=unhealthy
//! - `health_report_overall` (gauge): overall state rank of the last report
//! - `dispatch_total` (counter): dispatches by mode and outcome
//! - `dispatch_duration_seconds` (histogram): dispatch latency by mode
//! - `dispatch_pool_saturated_total` (counter): submissions rejected by backpressure
//! - `dispatch_abandoned_total` (counter): dispatches whose caller went away
//! - `dispatch_pool_active_workers` (gauge): workers currently running a unit
//! - `resolver_invocations_total` / `resolver_cache_hits_total` (counters)
//!
//! # Design Decisions
//! - Thin wrappers over the `metrics` facade so call sites stay one line
//! - Histogram buckets tuned for sub-second web latencies

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::dispatch::ExecutionMode;
use crate::health::HealthState;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    describe_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("http_requests_total", "Total HTTP requests handled");
    describe_histogram!("http_request_duration_seconds", "HTTP request latency");
    describe_histogram!("health_check_duration_seconds", "Latency of individual health checks");
    describe_gauge!("health_check_status", "Last state rank of each health check");
    describe_gauge!("health_report_overall", "State rank of the last aggregate report");
    describe_counter!("dispatch_total", "Computation dispatches by mode and outcome");
    describe_histogram!("dispatch_duration_seconds", "Computation dispatch latency");
    describe_counter!("dispatch_pool_saturated_total", "Pooled submissions rejected by backpressure");
    describe_counter!("dispatch_abandoned_total", "Dispatches abandoned by their caller");
    describe_gauge!("dispatch_pool_active_workers", "Workers currently running a unit");
    describe_counter!("resolver_invocations_total", "Producers invoked inside resolver scopes");
    describe_counter!("resolver_cache_hits_total", "Resolutions served from a scope cache");
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, path: String, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a single health check.
pub fn record_check(name: &str, state: HealthState, duration: Duration) {
    histogram!("health_check_duration_seconds", "check" => name.to_string())
        .record(duration.as_secs_f64());
    gauge!("health_check_status", "check" => name.to_string()).set(f64::from(state.rank()));
}

/// Record the overall state of an aggregate report.
pub fn record_report(overall: HealthState) {
    gauge!("health_report_overall").set(f64::from(overall.rank()));
}

/// Record a finished dispatch. `outcome` is a short machine label.
pub fn record_dispatch(mode: ExecutionMode, outcome: &'static str, duration: Duration) {
    counter!("dispatch_total", "mode" => mode.as_str(), "outcome" => outcome).increment(1);
    histogram!("dispatch_duration_seconds", "mode" => mode.as_str())
        .record(duration.as_secs_f64());
}

pub fn record_pool_saturated() {
    counter!("dispatch_pool_saturated_total").increment(1);
}

pub fn record_abandoned(mode: ExecutionMode) {
    counter!("dispatch_abandoned_total", "mode" => mode.as_str()).increment(1);
}

pub fn record_pool_active(active: usize) {
    gauge!("dispatch_pool_active_workers").set(active as f64);
}

/// Record the usage counters of a closed resolver scope.
pub fn record_resolver_scope(invocations: u64, hits: u64) {
    counter!("resolver_invocations_total").increment(invocations);
    counter!("resolver_cache_hits_total").increment(hits);
}
