//! Cross-origin session relay.
//!
//! Forwards requests under a configured path prefix to a fixed upstream
//! origin and rewrites the reply so a browser on another origin can keep
//! an authenticated session: `Set-Cookie` headers are re-scoped to the
//! relay's host and CORS headers are attached. Redirects pass through
//! untouched.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
