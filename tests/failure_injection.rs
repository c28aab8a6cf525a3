//! Failure injection tests: slow and failing probes, saturated and closed pools.

use axum::http::StatusCode;
use observable_service::config::SharedConfig;
use observable_service::dispatch::WorkerPool;
use observable_service::health::{
    probe_fn, probes, HealthAggregator, HealthCheck, ProbeError, ProbeReport,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_timed_out_check_degrades_report_not_endpoint() {
    let shared = SharedConfig::new(common::test_config());
    let aggregator = HealthAggregator::new()
        .with_check(common::delayed_check("a", Duration::from_millis(10), ProbeReport::healthy()))
        .with_check(common::delayed_check(
            "b",
            Duration::from_millis(20),
            ProbeReport::degraded("reachable but slow"),
        ))
        .with_check(
            common::delayed_check("c", Duration::from_secs(5), ProbeReport::healthy())
                .with_timeout(Duration::from_millis(40)),
        );
    let server = common::custom_server(shared, aggregator, Arc::new(WorkerPool::new(1).unwrap()));

    let start = Instant::now();
    let (status, body) = common::get_json(server.router(), "/health").await;
    let elapsed = start.elapsed();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"][0]["status"], "healthy");
    assert_eq!(body["checks"][1]["status"], "degraded");
    assert_eq!(body["checks"][2]["status"], "unhealthy");
    assert_eq!(body["checks"][2]["detail"], "timeout after 40ms");
    assert_eq!(body["checks"][2]["error"], "CHECK_TIMEOUT");
    assert!(body["checks"][2]["duration_ms"].as_f64().unwrap() <= 40.0);

    assert!(elapsed >= Duration::from_millis(40));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test]
async fn test_failing_probe_keeps_report_well_formed() {
    let shared = SharedConfig::new(common::test_config());
    let aggregator = HealthAggregator::new()
        .with_check(probes::app_check())
        .with_check(HealthCheck::new(
            "database",
            probe_fn(|| async {
                Err(ProbeError::Unavailable {
                    subsystem: "database".into(),
                    reason: "connection refused".into(),
                })
            }),
        ));
    let server = common::custom_server(shared, aggregator, Arc::new(WorkerPool::new(1).unwrap()));

    let (status, body) = common::get_json(server.router(), "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"][0]["status"], "healthy");
    assert_eq!(body["checks"][1]["detail"], "database unavailable: connection refused");
    assert_eq!(body["checks"][1]["error"], "CHECK_FAILED");
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn test_degraded_report_still_serves() {
    let shared = SharedConfig::new(common::test_config());
    let aggregator = HealthAggregator::new().with_check(common::delayed_check(
        "cache",
        Duration::ZERO,
        ProbeReport::degraded("hit rate low"),
    ));
    let server = common::custom_server(shared, aggregator, Arc::new(WorkerPool::new(1).unwrap()));

    let (status, body) = common::get_json(server.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_saturated_pool_returns_503() {
    let mut config = common::test_config();
    config.dispatch.pool_size = 1;
    config.dispatch.submission_timeout_ms = 20;
    let shared = SharedConfig::new(config.clone());
    let pool = Arc::new(WorkerPool::new(1).unwrap());
    let aggregator = probes::default_aggregator(&config, pool.clone());
    let server = common::custom_server(shared, aggregator, pool.clone());

    let _held = pool.acquire().await.unwrap();

    let start = Instant::now();
    let (status, body) = common::get_json(server.router(), "/observability/heavy").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "POOL_SATURATED");
    assert!(body["duration_ms"].as_f64().unwrap() >= 20.0);
    assert!(start.elapsed() < Duration::from_secs(1));

    // Saturation shows up as a degraded, still-serving report.
    let (status, body) = common::get_json(server.router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"][2]["detail"], "all 1 workers busy");

    // Inline work does not need a worker.
    let (status, _) = common::get_json(server.router(), "/observability/light").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_closed_pool_fails_health_and_heavy() {
    let config = common::test_config();
    let shared = SharedConfig::new(config.clone());
    let pool = Arc::new(WorkerPool::new(1).unwrap());
    let aggregator = probes::default_aggregator(&config, pool.clone());
    let server = common::custom_server(shared, aggregator, pool.clone());

    pool.shutdown();

    let (status, body) = common::get_json(server.router(), "/observability/heavy").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "POOL_CLOSED");

    let (status, body) = common::get_json(server.router(), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"][2]["status"], "unhealthy");
}

#[tokio::test]
async fn test_request_timeout_is_503_with_error_body() {
    let mut config = common::test_config();
    config.timeouts.request_secs = 1;
    config.dispatch.submission_timeout_ms = 5_000;
    config.dispatch.pool_size = 1;
    let shared = SharedConfig::new(config.clone());
    let pool = Arc::new(WorkerPool::new(1).unwrap());
    let server = common::custom_server(shared, HealthAggregator::new(), pool.clone());

    // Hold the only worker so the heavy request waits past the request timeout.
    let held = pool.acquire().await.unwrap();

    let (status, body) = common::get_json(server.router(), "/observability/heavy").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "REQUEST_TIMEOUT");
    assert!(body["detail"].as_str().unwrap().starts_with("request timed out after"));
    assert!(body["duration_ms"].as_f64().unwrap() >= 1000.0);

    drop(held);
    let (status, _) = common::get_json(server.router(), "/observability/heavy").await;
    assert_eq!(status, StatusCode::OK);
}
