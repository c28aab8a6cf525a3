//! Resolver failure types.

use thiserror::Error;
use uuid::Uuid;

/// Category of a producer failure, used by the transport to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input or precondition validation failed.
    Invalid,
    /// The requested resource or feature does not exist.
    NotFound,
    /// A dependency the producer needs is unavailable.
    Unavailable,
    /// Anything else.
    Internal,
}

/// A failure raised by a producer. Cached in the scope exactly like a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolverFailure {
    kind: FailureKind,
    message: String,
}

impl ResolverFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Invalid, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`ResolverScope::resolve`](super::ResolverScope::resolve).
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    /// The producer failed (now, or earlier in the same scope).
    #[error("resolver '{resolver}' failed: {failure}")]
    Failed {
        resolver: &'static str,
        failure: ResolverFailure,
    },

    /// The scope was torn down before this call.
    #[error("resolver scope {scope} is closed; '{resolver}' requested after teardown")]
    ScopeClosed { scope: Uuid, resolver: &'static str },

    /// The cached entry holds a different type than the caller asked for.
    #[error("resolver '{resolver}' holds a value of a different type")]
    TypeMismatch { resolver: &'static str },
}

impl ResolverError {
    /// Misuse of the scope, as opposed to a producer failing.
    pub fn is_programming_error(&self) -> bool {
        !matches!(self, ResolverError::Failed { .. })
    }

    /// The producer failure, if that is what this error is.
    pub fn failure(&self) -> Option<&ResolverFailure> {
        match self {
            ResolverError::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResolverError::Failed {
            resolver: "pagination",
            failure: ResolverFailure::invalid("limit must be <= 100"),
        };
        assert_eq!(
            err.to_string(),
            "resolver 'pagination' failed: limit must be <= 100"
        );
        assert!(!err.is_programming_error());
        assert_eq!(err.failure().map(|f| f.kind()), Some(FailureKind::Invalid));

        let err = ResolverError::TypeMismatch { resolver: "pagination" };
        assert!(err.is_programming_error());
        assert!(err.failure().is_none());
    }
}
