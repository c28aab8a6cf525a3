//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON or pretty)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The core never depends on a sink being installed; without a recorder
//!   every metric call is a no-op
//! - Request ID flows through the request context into every log line
//! - Metric names are defined in one place (metrics.rs)

pub mod logging;
pub mod metrics;
