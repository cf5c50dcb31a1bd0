//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, inbound URL/origin/hostname)
//!     → routing layer decides: proxy or fallback
//!     → proxy forwarder calls upstream
//!     → response.rs (rebuild headers, CORS) + cookie.rs (Set-Cookie rewrite)
//!     → Send to client
//! ```

pub mod cookie;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use cookie::{rewrite_set_cookie, Cookie, CookieAttribute};
pub use headers::HopByHop;
pub use request::{RequestContext, UuidRequestId, X_REQUEST_ID};
pub use response::{pass_through, ResponseRebuilder};
pub use server::HttpServer;
