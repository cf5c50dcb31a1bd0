//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (request id, upstream, status)
//!     → tower-http TraceLayer spans per request
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Request ID flows through all log lines for a request

pub mod logging;

pub use logging::init_logging;
