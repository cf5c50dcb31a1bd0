//! Upstream HTTP client capability.
//!
//! The forwarder only needs "send a request, get back status, headers and
//! a body stream". `UpstreamClient` is that seam; `ReqwestUpstreamClient`
//! is the production implementation.

use std::future::Future;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{Request, Response},
};

use crate::config::TimeoutConfig;
use crate::error::RelayError;

/// Sends one request upstream.
///
/// Implementations must not follow redirects and must surface repeated
/// response headers (notably `Set-Cookie`) as distinct values.
pub trait UpstreamClient: Send + Sync + 'static {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, RelayError>> + Send;
}

/// `reqwest`-backed upstream client.
#[derive(Debug, Clone)]
pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
}

impl ReqwestUpstreamClient {
    /// Build a client with redirects disabled and the configured deadlines.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl UpstreamClient for ReqwestUpstreamClient {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, RelayError> {
        let (parts, body) = request.into_parts();

        let url = reqwest::Url::parse(&parts.uri.to_string())
            .map_err(|_| RelayError::InvalidUpstreamUrl(parts.uri.to_string()))?;

        let mut builder = self
            .client
            .request(parts.method, url)
            .headers(parts.headers);
        if body.size_hint().exact() != Some(0) {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let response = builder.send().await.map_err(classify)?;
        let response: Response<reqwest::Body> = response.into();
        Ok(response.map(Body::new))
    }
}

fn classify(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::UpstreamTimeout
    } else {
        RelayError::UpstreamUnreachable(Box::new(err))
    }
}
