//! Health check definitions.
//!
//! # Responsibilities
//! - Define the probe seam that subsystems implement
//! - Pair a probe with its name and optional timeout override
//! - Define the immutable per-check result

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::health::state::HealthState;
use crate::normalize::{ResponseValue, ToResponseValue};
use crate::resolver::ResolverId;

/// What a probe reports when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub state: HealthState,
    pub detail: Option<String>,
}

impl ProbeReport {
    pub fn healthy() -> Self {
        Self {
            state: HealthState::Healthy,
            detail: None,
        }
    }

    pub fn healthy_with(detail: impl Into<String>) -> Self {
        Self {
            state: HealthState::Healthy,
            detail: Some(detail.into()),
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            state: HealthState::Degraded,
            detail: Some(detail.into()),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            state: HealthState::Unhealthy,
            detail: Some(detail.into()),
        }
    }
}

/// A probe that could not produce a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Failed(String),

    #[error("{subsystem} unavailable: {reason}")]
    Unavailable { subsystem: String, reason: String },
}

/// A nullary health probe.
pub trait Probe: Send + Sync {
    fn check(&self) -> BoxFuture<'_, Result<ProbeReport, ProbeError>>;
}

/// Adapter turning a closure into a [`Probe`].
pub struct FnProbe<F>(F);

impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ProbeReport, ProbeError>> + Send + 'static,
{
    fn check(&self) -> BoxFuture<'_, Result<ProbeReport, ProbeError>> {
        Box::pin((self.0)())
    }
}

pub fn probe_fn<F, Fut>(f: F) -> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ProbeReport, ProbeError>> + Send + 'static,
{
    FnProbe(f)
}

struct CheckInner {
    name: String,
    timeout: Option<Duration>,
    probe: Arc<dyn Probe>,
}

/// A named probe with an optional timeout override.
///
/// Clones share identity: within one resolver scope a check and its clones
/// run at most once.
#[derive(Clone)]
pub struct HealthCheck {
    inner: Arc<CheckInner>,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, probe: impl Probe + 'static) -> Self {
        Self {
            inner: Arc::new(CheckInner {
                name: name.into(),
                timeout: None,
                probe: Arc::new(probe),
            }),
        }
    }

    /// Override the aggregator's default timeout for this check.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CheckInner {
                name: self.inner.name.clone(),
                timeout: Some(timeout),
                probe: self.inner.probe.clone(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    pub(crate) fn resolver_id(&self) -> ResolverId {
        ResolverId::of_shared(&self.inner, "health_check")
    }

    pub(crate) fn probe(&self) -> &dyn Probe {
        self.inner.probe.as_ref()
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("name", &self.inner.name)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// Why a check ended up unhealthy without a probe report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

impl CheckError {
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Timeout(_) => "CHECK_TIMEOUT",
            CheckError::Failed(_) => "CHECK_FAILED",
        }
    }
}

/// Outcome of one check in one request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    name: String,
    state: HealthState,
    detail: Option<String>,
    duration: Duration,
    error: Option<CheckError>,
}

impl CheckResult {
    pub(crate) fn from_report(name: &str, report: ProbeReport, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: report.state,
            detail: report.detail,
            duration,
            error: None,
        }
    }

    /// Unhealthy result whose detail is the error's message.
    pub(crate) fn from_error(name: &str, error: CheckError, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: HealthState::Unhealthy,
            detail: Some(error.to_string()),
            duration,
            error: Some(error),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn error(&self) -> Option<&CheckError> {
        self.error.as_ref()
    }
}

impl ToResponseValue for CheckResult {
    fn to_response_value(&self) -> ResponseValue {
        ResponseValue::object()
            .with_field("name", self.name.as_str())
            .with_field("status", self.state.as_str())
            .with_optional_field("detail", self.detail.as_deref())
            .with_field("duration_ms", self.duration.as_secs_f64() * 1000.0)
            .with_optional_field("error", self.error.as_ref().map(CheckError::code))
    }
}
