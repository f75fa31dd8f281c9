//! Configuration management for Netwarden.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{NetwardenError, Result};
use crate::filter::Rule;

/// Main configuration for the Netwarden service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetwardenConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Filtering configuration
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Filter engine configuration, consumed once at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Requests admitted per one second window
    #[serde(default = "default_max_requests_per_second")]
    pub max_requests_per_second: u32,

    /// Source addresses that are always denied
    #[serde(default)]
    pub blocked_addresses: Vec<String>,

    /// Rules loaded at startup, in order
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_requests_per_second: default_max_requests_per_second(),
            blocked_addresses: Vec::new(),
            rules: Vec::new(),
        }
    }
}

fn default_max_requests_per_second() -> u32 {
    100
}

impl NetwardenConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| NetwardenError::Config(format!("Failed to parse configuration: {}", e)))
    }
}
