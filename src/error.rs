//! Relay error definitions and their mapping onto client responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while relaying a request upstream.
#[derive(Debug, Error)]
pub enum RelayError {
    /// DNS, connect or transport failure on the upstream call.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] BoxError),

    /// The upstream call exceeded its deadline.
    #[error("upstream timed out")]
    UpstreamTimeout,

    /// The inbound request URL could not be reconstructed.
    #[error("could not determine the inbound request URL")]
    InvalidRequest,

    /// The computed upstream URL could not be used as a request URI.
    #[error("invalid upstream URL {0:?}")]
    InvalidUpstreamUrl(String),

    /// The final upstream body exceeded the buffering limit.
    #[error("upstream response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// Reading the final upstream body failed.
    #[error("failed to read upstream body: {0}")]
    UpstreamBody(#[source] BoxError),
}

impl RelayError {
    /// Status code presented to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::InvalidRequest => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RelayError::UpstreamTimeout => "Upstream request timed out",
            RelayError::ResponseTooLarge { .. } => "Upstream response too large",
            RelayError::InvalidRequest => "Invalid request",
            _ => "Upstream request failed",
        };
        (status, body).into_response()
    }
}
