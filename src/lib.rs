//! Observable HTTP service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::request (resolver scope per request)
//!                                          │
//!                     ┌────────────────────┴────────────────────┐
//!                     ▼                                         ▼
//!              health::aggregator                       dispatch::dispatcher
//!              checks via resolver,                     inline on the request task,
//!              worst state wins                         or pooled on dispatch::pool
//!                     │                                         │
//!                     └────────────────────┬────────────────────┘
//!                                          ▼
//!     Client Response ◀─────────── normalize (UTC timestamps) + http::response
//!
//!     Cross-cutting: config (snapshots, reload), observability (tracing, metrics),
//!                    lifecycle (startup, signals, shutdown)
//! ```

// Core subsystems
pub mod dispatch;
pub mod health;
pub mod http;
pub mod normalize;
pub mod resolver;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
