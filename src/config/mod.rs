//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + APP_* environment
//!     → loader.rs (parse, deserialize, apply overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → snapshot.rs: ConfigSnapshot { version: 1, config } in an ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → publish ConfigSnapshot { version + 1, config }
//!     → requests started afterwards see the new snapshot
//! ```
//!
//! # Design Decisions
//! - A request captures one snapshot at start and keeps it to the end
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Worker pool size is read once at startup

pub mod loader;
pub mod schema;
pub mod snapshot;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{
    DispatchConfig, HealthConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    ServiceInfo, TimeoutConfig,
};
pub use snapshot::{ConfigSnapshot, SharedConfig};
