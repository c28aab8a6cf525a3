//! Response building and error mapping.
//!
//! # Responsibilities
//! - Render every body through the normalizer
//! - Map subsystem errors to HTTP status codes and stable error codes
//!
//! # Design Decisions
//! - Saturation and timeouts are 503 with an explicit code, never a hang
//! - Resolver misuse is a server bug and maps to 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::normalize::{normalize, ResponseValue};
use crate::resolver::{FailureKind, ResolverError};

/// Render a normalized JSON body with `status`.
pub fn normalized(status: StatusCode, body: &ResponseValue) -> Response {
    (status, Json(normalize(body))).into_response()
}

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// The request was cancelled while its computation was pending.
    #[error("computation abandoned after {0:?}")]
    Abandoned(Duration),

    /// The whole request ran past `timeouts.request_secs`.
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dispatch(DispatchError::WorkerLost { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Dispatch(_) | ApiError::Abandoned(_) | ApiError::RequestTimeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Resolver(ResolverError::Failed { failure, .. }) => match failure.kind() {
                FailureKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Resolver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Dispatch(e) => e.code(),
            ApiError::Abandoned(_) => "ABANDONED",
            ApiError::RequestTimeout(_) => "REQUEST_TIMEOUT",
            ApiError::Resolver(ResolverError::Failed { failure, .. }) => match failure.kind() {
                FailureKind::Invalid => "VALIDATION_ERROR",
                FailureKind::NotFound => "NOT_FOUND",
                FailureKind::Unavailable => "SERVICE_UNAVAILABLE",
                FailureKind::Internal => "INTERNAL_ERROR",
            },
            ApiError::Resolver(_) => "INTERNAL_ERROR",
        }
    }

    /// Time spent before failing, when known.
    fn elapsed(&self) -> Option<Duration> {
        match self {
            ApiError::Dispatch(e) => Some(e.elapsed()),
            ApiError::Abandoned(d) | ApiError::RequestTimeout(d) => Some(*d),
            ApiError::Resolver(_) => None,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Resolver(ResolverError::Failed { failure, .. }) => failure.message().to_string(),
            ApiError::Resolver(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Resolver(e) if e.is_programming_error() => {
                tracing::error!(error = %e, "Resolver scope misuse");
            }
            _ => tracing::warn!(error = %self, status = status.as_u16(), "Request failed"),
        }

        let body = ResponseValue::object()
            .with_field("error", self.code())
            .with_field("detail", self.detail())
            .with_optional_field(
                "duration_ms",
                self.elapsed().map(|d| d.as_secs_f64() * 1000.0),
            );

        normalized(status, &body)
    }
}
