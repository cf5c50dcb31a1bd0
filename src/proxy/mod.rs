//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! matched request
//!     → forwarder.rs (build upstream URL and request)
//!     → client.rs (UpstreamClient::send, redirects not followed)
//!     → 3xx + Location: pass through untouched
//!     → otherwise: buffer body → http::response::ResponseRebuilder
//! ```

pub mod client;
pub mod forwarder;

pub use client::{ReqwestUpstreamClient, UpstreamClient};
pub use forwarder::{ProxyForwarder, UpstreamTarget};
