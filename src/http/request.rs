//! Per-request context.
//!
//! # Responsibilities
//! - Open a resolver scope when a request arrives and close it after the response
//! - Capture the configuration snapshot current at request start
//! - Cancel the request's pending work if the client goes away
//! - Bound the whole request by `timeouts.request_secs` from that snapshot
//! - Record request metrics
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - A scope never outlives its request; nothing else holds it
//! - Handlers read configuration from the captured snapshot only

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigSnapshot;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resolver::ResolverScope;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Everything a handler needs that belongs to this request alone.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub scope: Arc<ResolverScope>,
    pub config: Arc<ConfigSnapshot>,
    pub cancel: CancellationToken,
}

/// Wrap each request in its own resolver scope.
pub async fn resolver_scope_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let ctx = RequestContext {
        request_id: request_id.clone(),
        scope: Arc::new(ResolverScope::new()),
        config: state.config.current(),
        cancel: CancellationToken::new(),
    };
    let scope = ctx.scope.clone();
    let request_timeout = ctx.config.config.timeouts.request();

    tracing::debug!(
        request_id = %request_id,
        scope = %scope.id(),
        config_version = ctx.config.version,
        method = %method,
        path = %path,
        "Request scope opened"
    );

    // Dropped with this future when the client disconnects mid-request.
    let _cancel_on_drop = ctx.cancel.clone().drop_guard();
    req.extensions_mut().insert(ctx);

    // On expiry the handler future is dropped, which abandons any pending work.
    let response = match tokio::time::timeout(request_timeout, next.run(req)).await {
        Ok(response) => response,
        Err(_) => ApiError::RequestTimeout(start.elapsed()).into_response(),
    };

    scope.close();
    metrics::record_request(&method, path, response.status().as_u16(), start);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_clones_share_scope_and_token() {
        let ctx = RequestContext {
            request_id: "req-1".to_string(),
            scope: Arc::new(ResolverScope::new()),
            config: Arc::new(ConfigSnapshot {
                version: 1,
                config: Default::default(),
            }),
            cancel: CancellationToken::new(),
        };
        let copy = ctx.clone();

        ctx.cancel.cancel();
        assert!(copy.cancel.is_cancelled());
        assert_eq!(ctx.scope.id(), copy.scope.id());
    }
}
