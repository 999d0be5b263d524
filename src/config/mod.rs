//! Configuration management for cookie-persist
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use cookie_persist::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Index cookie: {}", config.storage.index_key);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `COOKIE_PERSIST__<section>__<key>`
//!
//! Examples:
//! - `COOKIE_PERSIST__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `COOKIE_PERSIST__STORAGE__KEY_PREFIX=persist:`
//! - `COOKIE_PERSIST__STORAGE__INDEX_KEY=persistIndex`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/cookie-persist.toml`.
//! This can be overridden using the `COOKIE_PERSIST_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::Ttl;
pub use models::{Config, ExpirationSettings, ServerConfig, StorageSettings, TelemetryConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`COOKIE_PERSIST__*`)
    /// 2. TOML file (default: `config/cookie-persist.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (empty index key, unsafe cookie attributes, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage]
key_prefix = "persist:"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.storage.key_prefix, "persist:");
        assert_eq!(config.storage.index_key, "reduxPersistIndex");
    }

    #[test]
    fn test_load_rejects_invalid_cookie_options() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage.cookie]
same_site = "none"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(ValidationError::InsecureSameSiteNone))
        ));
    }

    #[test]
    fn test_load_rejects_bad_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage.expiration]
default = "3 fortnights"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
