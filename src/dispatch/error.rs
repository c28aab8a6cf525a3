//! Dispatch error definitions.

use std::time::Duration;
use thiserror::Error;

/// Errors that end a dispatch without a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No worker became free within the submission timeout.
    #[error("worker pool saturated: no worker available after {waited:?}")]
    PoolSaturated { waited: Duration },

    /// The pooled unit did not finish within the computation timeout.
    #[error("computation exceeded its {limit:?} limit")]
    TimedOut { limit: Duration, elapsed: Duration },

    /// The pool has been shut down.
    #[error("worker pool is shut down")]
    PoolClosed { elapsed: Duration },

    /// The worker running the unit panicked.
    #[error("pooled computation was lost: worker panicked")]
    WorkerLost { elapsed: Duration },
}

impl DispatchError {
    /// Time spent in the dispatcher before the error.
    pub fn elapsed(&self) -> Duration {
        match self {
            DispatchError::PoolSaturated { waited } => *waited,
            DispatchError::TimedOut { elapsed, .. }
            | DispatchError::PoolClosed { elapsed }
            | DispatchError::WorkerLost { elapsed } => *elapsed,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::PoolSaturated { .. } => "POOL_SATURATED",
            DispatchError::TimedOut { .. } => "COMPUTATION_TIMEOUT",
            DispatchError::PoolClosed { .. } => "POOL_CLOSED",
            DispatchError::WorkerLost { .. } => "WORKER_LOST",
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub(crate) fn outcome_label(&self) -> &'static str {
        match self {
            DispatchError::PoolSaturated { .. } => "saturated",
            DispatchError::TimedOut { .. } => "timeout",
            DispatchError::PoolClosed { .. } => "closed",
            DispatchError::WorkerLost { .. } => "lost",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_elapsed() {
        let err = DispatchError::PoolSaturated {
            waited: Duration::from_millis(50),
        };
        assert_eq!(
            err.to_string(),
            "worker pool saturated: no worker available after 50ms"
        );
        assert_eq!(err.elapsed(), Duration::from_millis(50));
        assert_eq!(err.code(), "POOL_SATURATED");

        let err = DispatchError::TimedOut {
            limit: Duration::from_secs(30),
            elapsed: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
        assert_eq!(err.code(), "COMPUTATION_TIMEOUT");
    }
}
