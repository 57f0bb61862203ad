//! Configuration types for the HTTP service

use discord_webhook_core::PluginConfig;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Discord application credentials
    #[serde(default)]
    pub discord: PluginConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate everything needed before the server accepts requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discord.validate()?;

        if !self.server.interactions_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "interactions_path must start with '/': {}",
                    self.server.interactions_path
                ),
            });
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "max_body_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Route that receives interaction webhooks
    pub interactions_path: String,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            interactions_path: "/interactions".to_string(),
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
