//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;

use thiserror::Error;

use stockbook_core::DEFAULT_TRANSACTION_LIST_CAP;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Cap on the general transaction listing
    pub transaction_list_cap: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 5000,
            database_path: "stockbook.db".to_string(),
            transaction_list_cap: DEFAULT_TRANSACTION_LIST_CAP,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "stockbook.db".to_string()),

            transaction_list_cap: env::var("TRANSACTION_LIST_CAP")
                .unwrap_or_else(|_| DEFAULT_TRANSACTION_LIST_CAP.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TRANSACTION_LIST_CAP".to_string()))?,
        };

        if config.transaction_list_cap == 0 {
            return Err(ConfigError::InvalidValue(
                "TRANSACTION_LIST_CAP must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
