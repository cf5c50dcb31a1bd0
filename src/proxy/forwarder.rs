//! Request forwarding to the upstream origin.
//!
//! # Responsibilities
//! - Compute the upstream URL from the configured target
//! - Forward method, headers and body unchanged (minus `Host` and
//!   hop-by-hop headers)
//! - Classify the upstream response as redirect or final
//! - Pass redirects through; buffer and rebuild final responses
//!
//! # Design Decisions
//! - Final bodies are buffered so headers can be rebuilt before the body
//!   is attached; `max_response_bytes` bounds the memory cost
//! - No retries; a failed upstream call maps straight to a 5xx
//! - Dropping the returned future aborts the in-flight upstream call

use std::borrow::Cow;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    http::{header, Request, Response, Uri},
};
use futures_util::StreamExt;

use crate::config::{ListenerConfig, RelayConfig, UpstreamConfig};
use crate::error::RelayError;
use crate::http::headers::HopByHop;
use crate::http::request::{request_id, RequestContext};
use crate::http::response::{pass_through, ResponseRebuilder};
use crate::proxy::client::UpstreamClient;

/// Where matching requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Scheme and host, no trailing slash.
    pub origin: String,
    pub prefix: String,
    pub strip_prefix: bool,
}

impl UpstreamTarget {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            origin: config.origin.trim_end_matches('/').to_string(),
            prefix: config.path_prefix.clone(),
            strip_prefix: config.strip_prefix,
        }
    }

    /// Apply the configured path transform.
    pub fn transform_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        if !self.strip_prefix {
            return Cow::Borrowed(path);
        }

        let stripped = path
            .strip_prefix(self.prefix.trim_end_matches('/'))
            .unwrap_or(path);
        if stripped.starts_with('/') {
            Cow::Borrowed(stripped)
        } else {
            Cow::Owned(format!("/{}", stripped))
        }
    }

    /// `origin + transformed path [+ "?" + query]`.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let path = self.transform_path(path);
        match query {
            Some(q) => format!("{}{}?{}", self.origin, path, q),
            None => format!("{}{}", self.origin, path),
        }
    }
}

/// Forwards requests to the upstream and shapes the reply.
#[derive(Debug)]
pub struct ProxyForwarder<C> {
    client: C,
    target: UpstreamTarget,
    listener: ListenerConfig,
    rebuilder: ResponseRebuilder,
    max_response_bytes: usize,
}

impl<C: UpstreamClient> ProxyForwarder<C> {
    pub fn new(config: &RelayConfig, client: C) -> Self {
        Self {
            client,
            target: UpstreamTarget::from_config(&config.upstream),
            listener: config.listener.clone(),
            rebuilder: ResponseRebuilder::new(config.cookies.same_site),
            max_response_bytes: config.upstream.max_response_bytes,
        }
    }

    /// Relay `req` upstream and build the outbound response.
    pub async fn forward(&self, req: Request<Body>) -> Result<Response<Body>, RelayError> {
        let start_time = Instant::now();
        let request_id = request_id(&req);

        let ctx = RequestContext::from_request(
            &req,
            &self.listener.scheme,
            &self.listener.bind_address,
        )
        .ok_or(RelayError::InvalidRequest)?;

        let url = self
            .target
            .upstream_url(req.uri().path(), req.uri().query());
        let uri: Uri = url
            .parse()
            .map_err(|_| RelayError::InvalidUpstreamUrl(url.clone()))?;

        let (parts, body) = req.into_parts();
        let mut upstream_req = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .body(body)
            .map_err(|_| RelayError::InvalidUpstreamUrl(url.clone()))?;

        let hop = HopByHop::from_headers(&parts.headers);
        let headers = upstream_req.headers_mut();
        for (name, value) in &parts.headers {
            if name != header::HOST && !hop.contains(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            upstream = %url,
            "Forwarding request"
        );

        let response = self.client.send(upstream_req).await?;
        let (upstream, body) = response.into_parts();

        if upstream.status.is_redirection() && upstream.headers.contains_key(header::LOCATION) {
            tracing::info!(
                request_id = %request_id,
                status = %upstream.status,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Passing redirect through"
            );
            return Ok(pass_through(upstream));
        }

        let body = read_body(body, self.max_response_bytes).await?;

        tracing::info!(
            request_id = %request_id,
            method = %parts.method,
            upstream = %url,
            status = %upstream.status,
            bytes = body.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        Ok(self.rebuilder.rebuild(&upstream, body, &ctx))
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, RelayError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RelayError::UpstreamBody(e.into_inner()))?;
        if buf.len() + chunk.len() > limit {
            return Err(RelayError::ResponseTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buf))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::sync::Mutex;

    /// What the mock saw for one call.
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub method: Method,
        pub uri: String,
        pub headers: HeaderMap,
        pub body: Bytes,
    }

    /// Records requests and replies with a canned response.
    pub(crate) struct MockClient {
        pub status: StatusCode,
        pub headers: Vec<(&'static str, &'static str)>,
        pub body: &'static str,
        pub fail: bool,
        pub seen: Mutex<Vec<Recorded>>,
    }

    impl MockClient {
        pub fn new(status: StatusCode, headers: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                status,
                headers,
                body: "payload",
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(StatusCode::OK, Vec::new())
            }
        }

        pub fn last(&self) -> Recorded {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl UpstreamClient for MockClient {
        async fn send(&self, request: Request<Body>) -> Result<Response<Body>, RelayError> {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            self.seen.lock().unwrap().push(Recorded {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            });

            if self.fail {
                return Err(RelayError::UpstreamUnreachable("connection refused".into()));
            }

            let mut builder = Response::builder().status(self.status);
            for (name, value) in &self.headers {
                builder = builder.header(*name, *value);
            }
            Ok(builder.body(Body::from(self.body)).unwrap())
        }
    }

    pub(crate) fn config(strip_prefix: bool) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.upstream.origin = "https://backend.example".to_string();
        config.upstream.strip_prefix = strip_prefix;
        config
    }

    fn target(strip_prefix: bool) -> UpstreamTarget {
        UpstreamTarget::from_config(&config(strip_prefix).upstream)
    }

    #[test]
    fn test_upstream_url_keeps_path() {
        assert_eq!(
            target(false).upstream_url("/api/users", Some("page=2&sort=name")),
            "https://backend.example/api/users?page=2&sort=name"
        );
        assert_eq!(
            target(false).upstream_url("/api/users", None),
            "https://backend.example/api/users"
        );
    }

    #[test]
    fn test_upstream_url_strips_prefix() {
        let target = target(true);
        assert_eq!(
            target.upstream_url("/api/users", Some("a=1")),
            "https://backend.example/users?a=1"
        );
        assert_eq!(target.upstream_url("/api/", None), "https://backend.example/");
        assert_eq!(target.upstream_url("/api", None), "https://backend.example/");
    }

    #[tokio::test]
    async fn test_forwards_method_headers_body() {
        let forwarder = ProxyForwarder::new(&config(false), MockClient::new(StatusCode::OK, vec![]));

        let req = Request::builder()
            .method(Method::POST)
            .uri("http://example.com/api/login?next=%2Fhome")
            .header("Host", "example.com")
            .header("Authorization", "Bearer t0k3n")
            .header("Cookie", "a=1")
            .header("Content-Type", "application/json")
            .header("X-Multi", "one")
            .header("X-Multi", "two")
            .header("Connection", "keep-alive, X-Browser-Hop")
            .header("Keep-Alive", "timeout=5")
            .header("X-Browser-Hop", "1")
            .header("Transfer-Encoding", "chunked")
            .header("Upgrade", "h2c")
            .header("Proxy-Connection", "keep-alive")
            .body(Body::from(r#"{"user":"u"}"#))
            .unwrap();

        forwarder.forward(req).await.unwrap();

        let seen = forwarder.client.last();
        assert_eq!(seen.method, Method::POST);
        assert_eq!(seen.uri, "https://backend.example/api/login?next=%2Fhome");
        assert_eq!(seen.headers["authorization"], "Bearer t0k3n");
        assert_eq!(seen.headers["cookie"], "a=1");
        assert_eq!(seen.headers["content-type"], "application/json");
        assert_eq!(seen.headers.get_all("x-multi").iter().count(), 2);
        assert!(seen.headers.get(header::HOST).is_none());
        for hop in [
            "connection",
            "keep-alive",
            "x-browser-hop",
            "transfer-encoding",
            "upgrade",
            "proxy-connection",
        ] {
            assert!(seen.headers.get(hop).is_none(), "{hop} was forwarded");
        }
        assert_eq!(seen.body, r#"{"user":"u"}"#);
    }

    #[tokio::test]
    async fn test_final_response_is_rebuilt() {
        let client = MockClient::new(
            StatusCode::OK,
            vec![
                ("set-cookie", "auth=abc; Path=/; Domain=backend.example; SameSite=Lax"),
                ("set-cookie", "b=2"),
            ],
        );
        let forwarder = ProxyForwarder::new(&config(false), client);

        let req = Request::builder()
            .uri("http://example.com/api/users")
            .body(Body::empty())
            .unwrap();
        let response = forwarder.forward(req).await.unwrap();

        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], "auth=abc; Path=/; Domain=example.com; SameSite=None; Secure");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://example.com");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "payload");
    }

    #[tokio::test]
    async fn test_redirect_passes_through() {
        let client = MockClient::new(
            StatusCode::FOUND,
            vec![("location", "https://x/y"), ("set-cookie", "a=b; SameSite=Lax")],
        );
        let forwarder = ProxyForwarder::new(&config(false), client);

        let req = Request::builder()
            .uri("http://example.com/api/oauth")
            .body(Body::empty())
            .unwrap();
        let response = forwarder.forward(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "https://x/y");
        assert_eq!(response.headers()["set-cookie"], "a=b; SameSite=Lax");
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_without_location_is_final() {
        let client = MockClient::new(StatusCode::NOT_MODIFIED, vec![("set-cookie", "a=b")]);
        let forwarder = ProxyForwarder::new(&config(false), client);

        let req = Request::builder()
            .uri("http://example.com/api/cached")
            .body(Body::empty())
            .unwrap();
        let response = forwarder.forward(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response.headers()["set-cookie"],
            "a=b; Domain=example.com; SameSite=None; Secure"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let forwarder = ProxyForwarder::new(&config(false), MockClient::failing());

        let req = Request::builder()
            .uri("http://example.com/api/users")
            .body(Body::empty())
            .unwrap();
        let err = forwarder.forward(req).await.unwrap_err();

        assert!(matches!(err, RelayError::UpstreamUnreachable(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_response_limit() {
        let mut config = config(false);
        config.upstream.max_response_bytes = 3;
        let forwarder = ProxyForwarder::new(&config, MockClient::new(StatusCode::OK, vec![]));

        let req = Request::builder()
            .uri("http://example.com/api/big")
            .body(Body::empty())
            .unwrap();
        let err = forwarder.forward(req).await.unwrap_err();

        assert!(matches!(err, RelayError::ResponseTooLarge { limit: 3 }));
    }
}
