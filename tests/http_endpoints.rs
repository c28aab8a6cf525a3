//! In-process endpoint tests driving the router with `oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use observable_service::config::SharedConfig;
use observable_service::http::HttpServer;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_health_reports_all_builtin_checks() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let (status, body) = common::get_json(server.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["pod_name"], "test-pod");
    assert_eq!(body["app_version"], env!("CARGO_PKG_VERSION"));

    let names: Vec<&str> = body["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["app", "observability", "worker_pool"]);
    assert_eq!(body["checks"][0]["detail"], "operational");
    assert_eq!(body["checks"][1]["detail"], "metrics exporter disabled");
    assert!(body["checks"][0]["duration_ms"].as_f64().unwrap() >= 0.0);
    assert!(body["checks"][0].get("error").is_none());

    let generated_at = body["generated_at"].as_str().unwrap();
    assert!(generated_at.ends_with("+00:00"), "not UTC: {generated_at}");
    assert_eq!(generated_at.len(), "2024-03-01T12:30:05+00:00".len());
}

#[tokio::test]
async fn test_heavy_runs_on_pool() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let (status, body) = common::get_json(server.router(), "/observability/heavy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 49_999_995_000_000u64);
    assert_eq!(body["mode"], "pooled");
    assert!(body["duration_ms"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_light_runs_inline() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let (status, body) = common::get_json(server.router(), "/observability/light").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 49_995_000u64);
    assert_eq!(body["mode"], "inline");
}

#[tokio::test]
async fn test_heavy_disabled_is_not_found() {
    let mut config = common::test_config();
    config.dispatch.enable_heavy_endpoints = false;
    let server = HttpServer::from_config(config).unwrap();

    let (status, body) = common::get_json(server.router(), "/observability/heavy").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["detail"], "heavy endpoints are disabled");

    // The light endpoint is unaffected.
    let (status, _) = common::get_json(server.router(), "/observability/light").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_root_reports_pod() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let (status, body) = common::get_json(server.router(), "/observability/root").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Observability Ready");
    assert_eq!(body["pod"], "test-pod");
}

#[tokio::test]
async fn test_request_id_is_set_and_propagated() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let response = server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let response = server
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = HttpServer::from_config(common::test_config()).unwrap();

    let (status, _) = common::get_json(server.router(), "/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requests_see_snapshot_published_before_they_start() {
    let shared = SharedConfig::new(common::test_config());
    let server = HttpServer::new(shared.clone()).unwrap();

    let (_, body) = common::get_json(server.router(), "/observability/root").await;
    assert_eq!(body["pod"], "test-pod");

    let mut changed = common::test_config();
    changed.service.pod_name = "pod-2".to_string();
    changed.dispatch.enable_heavy_endpoints = false;
    shared.publish(changed);

    let (_, body) = common::get_json(server.router(), "/observability/root").await;
    assert_eq!(body["pod"], "pod-2");

    let (status, _) = common::get_json(server.router(), "/observability/heavy").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
