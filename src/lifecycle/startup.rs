//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the worker pool and config reload tasks
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::config::loader::{load_config, load_from_env};
use crate::config::watcher::ConfigWatcher;
use crate::config::SharedConfig;
use crate::http::HttpServer;
use crate::lifecycle::signals;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

/// Run the service until SIGINT or SIGTERM.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        app = %config.service.app_name,
        version = %config.service.app_version,
        env = %config.service.env,
        pod = %config.service.pod_name,
        "Service starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        pool_size = config.dispatch.pool_size,
        check_timeout_ms = config.health.check_timeout_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shared = SharedConfig::new(config.clone());
    let shutdown = Shutdown::new();

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &config_path {
        Some(path) => {
            tokio::spawn(signals::reload_on_hangup(
                path.clone(),
                shared.clone(),
                shutdown.subscribe(),
            ));
            match ConfigWatcher::new(path, shared.clone()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, reload on SIGHUP only");
                    None
                }
            }
        }
        None => None,
    };

    let server = HttpServer::new(shared)?;
    let pool = server.pool();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        let signal = signals::wait_for_signal().await;
        tracing::info!(signal, "Shutdown requested");
        trigger.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tokio::task::spawn_blocking(move || pool.shutdown()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
