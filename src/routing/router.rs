//! Route lookup and dispatch.
//!
//! Requests under the proxy prefix go to the forwarder. Everything else
//! gets a fixed informational reply; a miss is not an error.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response, StatusCode},
    response::IntoResponse,
};

use crate::config::RelayConfig;
use crate::http::request::request_id;
use crate::proxy::{ProxyForwarder, UpstreamClient};
use crate::routing::matcher::PathPrefixMatcher;

/// Immutable after construction; shared across requests via `Arc`.
#[derive(Debug)]
pub struct Router<C> {
    matcher: PathPrefixMatcher,
    forwarder: ProxyForwarder<C>,
}

impl<C: UpstreamClient> Router<C> {
    pub fn new(config: &RelayConfig, client: C) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(config.upstream.path_prefix.clone()),
            forwarder: ProxyForwarder::new(config, client),
        }
    }

    /// Dispatch one inbound request.
    pub async fn route(&self, req: Request<Body>) -> Response<Body> {
        if !self.matcher.matches(&req) {
            tracing::debug!(path = %req.uri().path(), "No route matched, serving fallback");
            return self.fallback_response();
        }

        let request_id = request_id(&req);
        match self.forwarder.forward(req).await {
            Ok(response) => response,
            Err(err) => {
                if err.status() == StatusCode::GATEWAY_TIMEOUT {
                    tracing::warn!(request_id = %request_id, error = %err, "Upstream timed out");
                } else {
                    tracing::error!(request_id = %request_id, error = %err, "Upstream error");
                }
                err.into_response()
            }
        }
    }

    /// The reply for paths outside the proxy prefix.
    pub fn fallback_response(&self) -> Response<Body> {
        let body = fallback_text(self.matcher.prefix());
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// Body of the fallback reply.
pub fn fallback_text(prefix: &str) -> String {
    format!(
        "This is a proxy worker. API requests should be sent to {}...",
        prefix
    )
}
