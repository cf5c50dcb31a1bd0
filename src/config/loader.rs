//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that take precedence over the config file, usually sourced from
/// CLI flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub upstream_origin: Option<String>,
    pub path_prefix: Option<String>,
    pub strip_prefix: Option<bool>,
    pub bind_address: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(origin) = self.upstream_origin {
            config.upstream.origin = origin;
        }
        if let Some(prefix) = self.path_prefix {
            config.upstream.path_prefix = prefix;
        }
        if let Some(strip) = self.strip_prefix {
            config.upstream.strip_prefix = strip;
        }
        if let Some(addr) = self.bind_address {
            config.listener.bind_address = addr;
        }
    }
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Build the effective configuration: defaults, then the optional TOML
/// file, then overrides. The result is normalized and validated.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => RelayConfig::default(),
    };

    overrides.apply(&mut config);
    normalize(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn normalize(config: &mut RelayConfig) {
    let trimmed = config.upstream.origin.trim().trim_end_matches('/').to_string();
    config.upstream.origin = trimmed;
}
