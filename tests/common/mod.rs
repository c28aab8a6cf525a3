//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use observable_service::config::{ServiceConfig, SharedConfig};
use observable_service::dispatch::{DispatchLimits, Dispatcher, WorkerPool};
use observable_service::health::{probe_fn, HealthAggregator, HealthCheck, ProbeReport};
use observable_service::http::HttpServer;
use observable_service::lifecycle::Shutdown;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Defaults suitable for tests: small pool, no metrics exporter, ephemeral port.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.service.pod_name = "test-pod".to_string();
    config.dispatch.pool_size = 2;
    config.observability.metrics_enabled = false;
    config
}

/// A server with custom checks and pool, sharing `config`.
pub fn custom_server(
    config: SharedConfig,
    aggregator: HealthAggregator,
    pool: Arc<WorkerPool>,
) -> HttpServer {
    let limits = DispatchLimits::from(&config.current().config.dispatch);
    HttpServer::with_parts(config, aggregator, Dispatcher::new(pool, limits))
}

/// A check that sleeps for `delay` and then reports `report`.
pub fn delayed_check(name: &str, delay: Duration, report: ProbeReport) -> HealthCheck {
    HealthCheck::new(
        name,
        probe_fn(move || {
            let report = report.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(report)
            }
        }),
    )
}

/// Send a GET through the router in-process and parse the JSON body.
pub async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Bind an ephemeral port and serve in the background.
pub async fn start_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client without connection pooling or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
