//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → env / CLI overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the router and forwarder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing reads ambient globals
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::{
    CookieConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, SameSitePolicy,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
