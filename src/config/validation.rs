//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size and timeouts > 0)
//! - Check that addresses parse
//! - Leave room for a full dispatch inside the request timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, tagged with the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.health.check_timeout_ms == 0 {
        errors.push(ValidationError::new("health.check_timeout_ms", "must be > 0"));
    }

    if config.dispatch.pool_size == 0 {
        errors.push(ValidationError::new("dispatch.pool_size", "must be > 0"));
    }
    if config.dispatch.submission_timeout_ms == 0 {
        errors.push(ValidationError::new("dispatch.submission_timeout_ms", "must be > 0"));
    }
    if config.dispatch.computation_timeout_ms == 0 {
        errors.push(ValidationError::new("dispatch.computation_timeout_ms", "must be > 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    } else {
        // A request must outlast a pooled unit that waits and then runs to its limit.
        let dispatch_ms = config
            .dispatch
            .submission_timeout_ms
            .saturating_add(config.dispatch.computation_timeout_ms);
        if config.timeouts.request_secs.saturating_mul(1000) <= dispatch_ms {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!(
                    "{}s does not exceed submission + computation timeouts ({}ms)",
                    config.timeouts.request_secs, dispatch_ms
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
