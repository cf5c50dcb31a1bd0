//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Reconstruct the inbound request URL, origin and hostname
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Absolute request URIs win; otherwise `X-Forwarded-Proto` and `Host`
//!   are consulted, then the listener's own scheme and address

use axum::http::{header, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request ID layer.
pub fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Where the inbound request was addressed, as seen by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Full inbound URL.
    pub url: Url,
}

impl RequestContext {
    /// Derive the context for `req`.
    ///
    /// `default_scheme` and `default_authority` are used when the request
    /// itself does not say how it was addressed.
    pub fn from_request<B>(
        req: &Request<B>,
        default_scheme: &str,
        default_authority: &str,
    ) -> Option<Self> {
        let uri = req.uri();
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let scheme = uri
            .scheme_str()
            .or_else(|| {
                req.headers()
                    .get(X_FORWARDED_PROTO)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
            })
            .unwrap_or(default_scheme);

        let authority = uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| req.headers().get(header::HOST).and_then(|v| v.to_str().ok()))
            .unwrap_or(default_authority);

        let url = Url::parse(&format!("{}://{}{}", scheme, authority, path_and_query)).ok()?;
        Some(Self { url })
    }

    /// `scheme://host[:port]` of the inbound request.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Hostname of the inbound request, without port.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}
