//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → aggregator.rs: for each registered check, concurrently
//!         → ResolverScope::resolve (a check runs at most once per request)
//!         → probe raced against its timeout (check.rs)
//!             success  → probe-supplied state
//!             failure  → Unhealthy, detail = failure message
//!             timeout  → Unhealthy, detail = "timeout after <budget>"
//!     → state.rs: overall = worst state, Healthy when empty
//!     → AggregateReport (checks in registration order)
//! ```
//!
//! # Design Decisions
//! - A slow or failing subsystem degrades the report; it never fails the endpoint
//! - Checks are independently timed and independently failing
//! - Built-in probes (probes.rs) cover the service's own subsystems

pub mod aggregator;
pub mod check;
pub mod probes;
pub mod state;

pub use aggregator::{AggregateReport, HealthAggregator};
pub use check::{
    probe_fn, CheckError, CheckResult, HealthCheck, Probe, ProbeError, ProbeReport,
};
pub use state::{reduce, HealthState};
