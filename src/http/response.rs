//! Response handling and transformation.
//!
//! # Responsibilities
//! - Rebuild final upstream responses for the browser: copy headers,
//!   rewrite every `Set-Cookie`, attach CORS headers
//! - Pass redirects through untouched, without a body
//!
//! # Design Decisions
//! - The outbound header map is built from scratch, never patched
//! - Non-cookie headers are last-value-wins; `Set-Cookie` keeps its
//!   multiplicity and order
//! - Hop-by-hop headers stripped; hyper frames the buffered body itself
//! - The body is never inspected

use axum::{
    body::{Body, Bytes},
    http::{
        header::{self, HeaderMap, HeaderValue},
        response::Parts,
        Response,
    },
};

use crate::config::SameSitePolicy;
use crate::http::cookie::rewrite_set_cookie;
use crate::http::headers::HopByHop;
use crate::http::request::RequestContext;

pub const CORS_ALLOW_CREDENTIALS: &str = "true";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Builds outbound responses from buffered upstream responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseRebuilder {
    same_site: SameSitePolicy,
}

impl ResponseRebuilder {
    pub fn new(same_site: SameSitePolicy) -> Self {
        Self { same_site }
    }

    /// Rebuild a final (non-redirect) response.
    pub fn rebuild(&self, upstream: &Parts, body: Bytes, ctx: &RequestContext) -> Response<Body> {
        let mut headers = HeaderMap::with_capacity(upstream.headers.len() + 4);
        let hop = HopByHop::from_headers(&upstream.headers);

        for (name, value) in &upstream.headers {
            if name != header::SET_COOKIE && !hop.contains(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        let hostname = ctx.hostname();
        for value in upstream.headers.get_all(header::SET_COOKIE) {
            let rewritten = value
                .to_str()
                .ok()
                .and_then(|raw| rewrite_set_cookie(raw, hostname, self.same_site))
                .and_then(|cookie| HeaderValue::from_str(&cookie).ok());

            match rewritten {
                Some(cookie) => {
                    headers.append(header::SET_COOKIE, cookie);
                }
                None => tracing::debug!(cookie = ?value, "Dropping unparseable Set-Cookie"),
            }
        }

        insert_cors_headers(&mut headers, &ctx.origin());

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Forward a redirect unmodified, minus its body.
///
/// Framing and hop-by-hop headers are dropped since no body follows.
pub fn pass_through(upstream: Parts) -> Response<Body> {
    let mut headers = HeaderMap::with_capacity(upstream.headers.len());
    let hop = HopByHop::from_headers(&upstream.headers);
    for (name, value) in &upstream.headers {
        if name != header::CONTENT_LENGTH && !hop.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut response = Response::new(Body::empty());
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}

fn insert_cors_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(origin) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static(CORS_ALLOW_CREDENTIALS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}
