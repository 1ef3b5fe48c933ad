//! Configuration management for chatgate
//!
//! Strongly-typed configuration with TOML support. Every section has
//! defaults, so an empty file (or no file at all) is a valid configuration.

use crate::error::{Error, Result};
use crate::resolve::SystemResolver;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default whitelist rule string
pub const DEFAULT_WHITELIST: &str = "127.0.0.1,localhost";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IP whitelist settings
    pub whitelist: WhitelistConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Text generation API settings
    pub generation: GenerationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(Error::config_value(
                "server.bind",
                format!("'{}' is not a socket address", self.server.bind),
            ));
        }

        if self.whitelist.resolve_timeout_ms == 0 {
            return Err(Error::config_value(
                "whitelist.resolve_timeout_ms",
                "Must be greater than zero",
            ));
        }

        if self.generation.base_url.trim().is_empty() {
            return Err(Error::config_value("generation.base_url", "Must not be empty"));
        }

        if self.generation.model.trim().is_empty() {
            return Err(Error::config_value("generation.model", "Must not be empty"));
        }

        if self.generation.timeout_secs == 0 {
            return Err(Error::config_value(
                "generation.timeout_secs",
                "Must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(Error::from)
    }
}

/// IP whitelist configuration (`ip.whitelist`, `ip.whitelist.enabled`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelistConfig {
    /// Comma-separated rule tokens
    pub rules: String,
    /// Master switch; a disabled whitelist allows everything
    pub enabled: bool,
    /// Look up hostnames for CIDR rules (literals are always accepted)
    pub resolve_hostnames: bool,
    /// Upper bound for a single hostname lookup
    pub resolve_timeout_ms: u64,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            rules: DEFAULT_WHITELIST.to_string(),
            enabled: true,
            resolve_hostnames: true,
            resolve_timeout_ms: 2000,
        }
    }
}

impl WhitelistConfig {
    /// Resolver matching these settings
    pub fn resolver(&self) -> SystemResolver {
        SystemResolver::new(
            self.resolve_hostnames,
            Duration::from_millis(self.resolve_timeout_ms),
        )
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Text generation API configuration (`deepseek.*`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API key; required to serve requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stdout only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}
