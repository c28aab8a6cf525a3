//! Computation dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Handler builds a WorkUnit
//!     Inline  → dispatcher.rs runs it on the calling task,
//!               racing the request's cancellation token
//!     Pooled  → pool.rs: wait for a worker permit (submission timeout)
//!                 timeout       → PoolSaturated
//!                 permit        → job sent to a worker thread
//!             → dispatcher.rs waits for the result (computation timeout),
//!               or stops waiting when the request is cancelled
//!     → DispatchResult { outcome, mode, duration }
//! ```
//!
//! # Design Decisions
//! - The pool is fixed-size and owned; it never grows under load
//! - Permits bound occupancy; a permit lives as long as its unit runs
//! - Pooled units are never killed; an abandoned result is discarded
//! - Elapsed time is reported on success and on every error

pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod units;

pub use dispatcher::{
    DispatchLimits, DispatchOutcome, DispatchResult, Dispatcher, ExecutionMode, WorkUnit,
};
pub use error::DispatchError;
pub use pool::{Occupancy, WorkerPool};
