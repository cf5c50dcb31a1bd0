//! Hop-by-hop header handling.
//!
//! These headers describe a single connection (browser to relay, or relay
//! to upstream) and are never carried across the relay in either
//! direction. Framing is re-derived by hyper for the outgoing message.

use axum::http::{header, HeaderMap, HeaderName};

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Names that must not cross the relay: the fixed hop-by-hop set plus any
/// extra header listed in `Connection`.
#[derive(Debug, Default)]
pub struct HopByHop {
    listed: Vec<HeaderName>,
}

impl HopByHop {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let listed = headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
            .collect();
        Self { listed }
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        HOP_BY_HOP.contains(name) || self.listed.contains(name)
    }
}
