use crate::humanize::Ttl;
use crate::jar::CookieOptions;
use crate::storage::DEFAULT_INDEX_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Cookie storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default = "default_index_key")]
    pub index_key: String,
    #[serde(default)]
    pub serialize_index_writes: bool,
    #[serde(default)]
    pub expiration: ExpirationSettings,
    /// Pass-through attributes for every cookie write
    #[serde(default)]
    pub cookie: CookieOptions,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            index_key: default_index_key(),
            serialize_index_writes: false,
            expiration: ExpirationSettings::default(),
            cookie: CookieOptions::default(),
        }
    }
}

fn default_index_key() -> String {
    DEFAULT_INDEX_KEY.to_string()
}

/// Expiration policy as written in configuration
///
/// `default` absent or `"session"` means session cookies. Per-key entries
/// accept the same values, `"session"` overriding a default TTL.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExpirationSettings {
    #[serde(default)]
    pub default: Option<Ttl>,
    #[serde(default)]
    pub keys: HashMap<String, Ttl>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
