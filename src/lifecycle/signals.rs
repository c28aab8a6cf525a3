//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT and report which one arrived
//! - Reload the configuration file on SIGHUP
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown

use std::path::PathBuf;
use tokio::signal;
use tokio::sync::broadcast;

use crate::config::snapshot::SharedConfig;
use crate::config::watcher::{reload, ReloadOutcome};

/// Resolve when the process is asked to stop. Returns the signal name.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Reload `path` into `shared` on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_hangup(
    path: PathBuf,
    shared: SharedConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
                match reload(&path, &shared) {
                    Ok(ReloadOutcome::Published(version)) => {
                        tracing::info!(version, "Configuration reloaded on SIGHUP");
                    }
                    Ok(ReloadOutcome::Unchanged) => tracing::debug!("Configuration unchanged"),
                    Err(e) => tracing::error!(
                        "Failed to reload config: {}. Keeping current configuration.",
                        e
                    ),
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(
    _path: PathBuf,
    _shared: SharedConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let _ = shutdown.recv().await;
}
