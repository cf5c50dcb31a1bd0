//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (prefix check)
//!     → router.rs: match → proxy::ProxyForwarder
//!                  miss  → static fallback (200, text/plain)
//! ```
//!
//! # Design Decisions
//! - Built once at startup, immutable at runtime
//! - Deterministic: same path always takes the same branch

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{fallback_text, Router};
