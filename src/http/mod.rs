//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → SetRequestId → Trace → PropagateRequestId
//!     → request.rs (resolver scope + config snapshot + cancellation token + request timeout)
//!     → handlers.rs (health aggregator / dispatcher)
//!     → response.rs (normalize body, map errors to status codes)
//!     → Send to client; request.rs closes the scope
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{resolver_scope_middleware, RequestContext, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
