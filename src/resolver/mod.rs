//! Request-scoped resolver subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → http::request middleware creates a ResolverScope
//!     → handlers / aggregator call scope.resolve(id, producer)
//!         first call for id  → producer runs, result or failure stored
//!         concurrent caller  → waits on the in-flight cell
//!         later caller       → stored result cloned out
//!     → response sent
//!     → scope.close() drops every cached entry
//! ```
//!
//! # Design Decisions
//! - Scopes are explicit values passed by reference, never ambient or global
//! - Identity is the producer's definition (type) or a shared allocation (address)
//! - Failures are cached like values; nothing is retried inside one scope
//! - Using a closed scope is a programming error surfaced as `ResolverError`

pub mod error;
pub mod scope;

pub use error::{FailureKind, ResolverError, ResolverFailure};
pub use scope::{ResolverId, ResolverScope, ScopeStats};
