//! Route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Extension,
};

use crate::dispatch::{units, DispatchLimits, DispatchResult};
use crate::http::request::RequestContext;
use crate::http::response::{normalized, ApiError};
use crate::http::server::AppState;
use crate::normalize::{ResponseValue, ToResponseValue};
use crate::resolver::ResolverFailure;

/// `GET /health`: 200 unless the overall state is unhealthy.
pub async fn health(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, ApiError> {
    let config = &ctx.config.config;
    let report = state
        .aggregator
        .run(&ctx.scope, config.health.check_timeout())
        .await?;

    let status = if report.overall().is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        request_id = %ctx.request_id,
        overall = %report.overall(),
        "Health report served"
    );

    let body = report
        .to_response_value()
        .with_field("pod_name", config.service.pod_name.as_str())
        .with_field("app_version", config.service.app_version.as_str());

    Ok(normalized(status, &body))
}

/// `GET /observability/heavy`: CPU-bound sum on the worker pool.
pub async fn heavy(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, ApiError> {
    let enabled = ctx.config.config.dispatch.enable_heavy_endpoints;
    ctx.scope
        .resolve_fn(move || async move {
            if enabled {
                Ok(())
            } else {
                Err(ResolverFailure::not_found("heavy endpoints are disabled"))
            }
        })
        .await?;

    let limits = DispatchLimits::from(&ctx.config.config.dispatch);
    let result = state
        .dispatcher
        .dispatch_with_limits(units::heavy_unit(), limits, &ctx.cancel)
        .await?;

    computation_response(result)
}

/// `GET /observability/light`: short cooperative sum on the request task.
pub async fn light(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, ApiError> {
    let limits = DispatchLimits::from(&ctx.config.config.dispatch);
    let result = state
        .dispatcher
        .dispatch_with_limits(units::light_unit(), limits, &ctx.cancel)
        .await?;

    computation_response(result)
}

/// `GET /observability/root`
pub async fn root(Extension(ctx): Extension<RequestContext>) -> Response {
    let body = ResponseValue::object()
        .with_field("message", "Observability Ready")
        .with_field("pod", ctx.config.config.service.pod_name.as_str());

    normalized(StatusCode::OK, &body)
}

fn computation_response(result: DispatchResult<u64>) -> Result<Response, ApiError> {
    if result.is_abandoned() {
        return Err(ApiError::Abandoned(result.duration()));
    }
    Ok(normalized(StatusCode::OK, &result.to_response_value()))
}
