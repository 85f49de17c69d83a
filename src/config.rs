//! Server configuration, read from `CARDASH_*` environment variables in one pass.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::observability::{LogFormat, LoggingConfig};

pub const DEFAULT_DATA_PATH: &str = "vehicles_us.csv";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Unset and blank variables keep their defaults. An unknown log format or target flag also
/// keeps the default; only a bad bind address is an error.
pub fn dashboard_config_from_env() -> Result<DashboardConfig, ConfigError> {
    let mut config = DashboardConfig::default();

    if let Some(path) = non_blank_var("CARDASH_DATA_PATH") {
        config.data_path = PathBuf::from(path);
    }
    if let Some(addr) = non_blank_var("CARDASH_DASHBOARD_ADDR") {
        config.bind_addr = addr
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: addr.clone(),
                source,
            })?;
    }

    if let Some(filter) = non_blank_var("CARDASH_LOG_LEVEL") {
        config.logging.filter = filter;
    }
    if let Some(format) = non_blank_var("CARDASH_LOG_FORMAT").and_then(|raw| LogFormat::parse(&raw))
    {
        config.logging.format = format;
    }
    if let Some(flag) = non_blank_var("CARDASH_LOG_TARGET").and_then(|raw| parse_flag(&raw)) {
        config.logging.include_target = flag;
    }

    Ok(config)
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
