//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, resolver scope with request timeout)
//! - Bind server to listener
//! - Stop on the shutdown broadcast

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ServiceConfig, SharedConfig};
use crate::dispatch::{DispatchLimits, Dispatcher, WorkerPool};
use crate::health::{probes, HealthAggregator};
use crate::http::handlers;
use crate::http::request::resolver_scope_middleware;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub aggregator: Arc<HealthAggregator>,
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the service.
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Build the server and its worker pool from a shared configuration.
    pub fn new(config: SharedConfig) -> std::io::Result<Self> {
        let snapshot = config.current();
        let pool = Arc::new(WorkerPool::new(snapshot.config.dispatch.pool_size)?);
        let aggregator = probes::default_aggregator(&snapshot.config, pool.clone());
        let dispatcher = Dispatcher::new(pool, DispatchLimits::from(&snapshot.config.dispatch));

        Ok(Self::with_parts(config, aggregator, dispatcher))
    }

    /// Build from a plain configuration, e.g. in tests.
    pub fn from_config(config: ServiceConfig) -> std::io::Result<Self> {
        Self::new(SharedConfig::new(config))
    }

    /// Assemble from explicit parts, e.g. a custom set of checks.
    pub fn with_parts(
        config: SharedConfig,
        aggregator: HealthAggregator,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            state: AppState {
                config,
                aggregator: Arc::new(aggregator),
                dispatcher: Arc::new(dispatcher),
            },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The worker pool, for shutdown after the server stops.
    pub fn pool(&self) -> Arc<WorkerPool> {
        self.state.dispatcher.pool().clone()
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/observability/heavy", get(handlers::heavy))
            .route("/observability/light", get(handlers::light))
            .route("/observability/root", get(handlers::root))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                resolver_scope_middleware,
            ))
            .with_state(self.state.clone())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
