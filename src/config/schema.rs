//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, assumed scheme).
    pub listener: ListenerConfig,

    /// Upstream origin and path transform.
    pub upstream: UpstreamConfig,

    /// Cookie rewriting policy.
    pub cookies: CookieConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Scheme assumed for inbound requests when neither the request URI
    /// nor `X-Forwarded-Proto` carries one.
    pub scheme: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            scheme: "http".to_string(),
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream origin, scheme and host only (e.g., "https://backend.example").
    pub origin: String,

    /// Path prefix selecting requests to relay.
    pub path_prefix: String,

    /// Strip the matched prefix before appending the path to the origin.
    pub strip_prefix: bool,

    /// Largest upstream body buffered for a rewritten response.
    pub max_response_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            path_prefix: "/api/".to_string(),
            strip_prefix: false,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

/// How an upstream `SameSite` attribute is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SameSitePolicy {
    /// Always emit `SameSite=None`.
    #[default]
    ForceNone,
    /// Keep the upstream value; add `SameSite=None` only when missing.
    Preserve,
}

/// Cookie rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CookieConfig {
    pub same_site: SameSitePolicy,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream call timeout (headers and body) in seconds.
    pub upstream_secs: u64,

    /// Inbound request ceiling in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "cors_relay=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
