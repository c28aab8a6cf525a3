//! Load and end-to-end tests over a real listener.

use observable_service::http::HttpServer;
use std::time::{Duration, Instant};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_to_end_over_tcp() {
    let server = HttpServer::from_config(common::test_config()).unwrap();
    let (addr, shutdown) = common::start_server(server).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/observability/heavy", addr))
        .send()
        .await
        .expect("service unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["result"], 49_999_995_000_000u64);
    assert_eq!(body["mode"], "pooled");

    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pooled_load_never_exceeds_pool_size() {
    let mut config = common::test_config();
    config.dispatch.pool_size = 2;
    config.dispatch.submission_timeout_ms = 10_000;
    let server = HttpServer::from_config(config).unwrap();
    let pool = server.pool();
    let (addr, shutdown) = common::start_server(server).await;

    let concurrency = 8;
    let requests_per_task = 3;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for i in 0..concurrency {
        let client = client.clone();
        // Mix cooperative and pooled work.
        let url = if i % 2 == 0 {
            format!("http://{}/observability/heavy", addr)
        } else {
            format!("http://{}/observability/light", addr)
        };
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let duration = start.elapsed();

    assert_eq!(all_latencies.len(), total_requests, "some requests failed");
    assert!(pool.occupancy().peak <= pool.size());

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p95 = all_latencies[(all_latencies.len() as f64 * 0.95) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P95 Latency:    {:?}", p95);
    println!("Peak Workers:   {}", pool.occupancy().peak);
    println!("-------------------------\n");

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_health_stays_responsive_while_pool_is_busy() {
    let mut config = common::test_config();
    config.dispatch.pool_size = 1;
    let server = HttpServer::from_config(config).unwrap();
    let pool = server.pool();
    let (addr, shutdown) = common::start_server(server).await;

    // Occupy the only worker with a slow unit.
    let permit = pool.acquire().await.unwrap();
    let busy = pool
        .submit(permit, || std::thread::sleep(Duration::from_millis(500)))
        .unwrap();

    let client = common::client();
    let start = Instant::now();
    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(start.elapsed() < Duration::from_millis(500));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "degraded");

    busy.await.unwrap();
    shutdown.trigger();
}
