//! Cookie-backed key-value storage for a state-persistence layer
//!
//! Every entry is one cookie named `key_prefix + key`. Cookie jars cannot
//! enumerate their contents, so the adapter also maintains an index cookie
//! (`index_key`) holding a JSON array of every registered key, in
//! first-insertion order.
//!
//! ## Consistency
//!
//! `set_item` and `remove_item` write the entry first and then
//! read-modify-write the index. The two writes are not atomic: if the index
//! write fails the index under-reports. Two unserialized writers on the same
//! index race and the last index write wins; enable
//! [`StorageOptions::serialize_index_writes`] to queue index updates per
//! storage instance.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cookie_persist::storage::{CookieStorage, Expiration, StorageOptions};
//! use cookie_persist::humanize::Ttl;
//!
//! let options = StorageOptions::builder()
//!     .key_prefix("persist:")
//!     .expiration(Expiration::after(Ttl::from_secs(3600)))
//!     .build();
//! let storage = CookieStorage::in_memory(options);
//!
//! storage.set_item("root", r#"{"user":null}"#).await?;
//! assert_eq!(storage.get_all_keys().await?, vec!["root"]);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::StorageSettings;
use crate::humanize::Ttl;
use crate::jar::{CookieJar, CookieOptions, JarError, MapJar, MemoryJar};
use crate::observability::Metrics;

mod traits;

pub use traits::PersistStorage;

/// Index cookie name used when none is configured
pub const DEFAULT_INDEX_KEY: &str = "reduxPersistIndex";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("index cookie '{index_key}' is corrupt: {source}")]
    CorruptIndex {
        index_key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("key '{0}' maps onto the index cookie")]
    ReservedKey(String),

    #[error(transparent)]
    Jar(#[from] JarError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Expiration policy: a fallback TTL plus per-key overrides
///
/// `None` means session cookie. A zero TTL is treated the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expiration {
    pub default: Option<Ttl>,
    overrides: HashMap<String, Option<Ttl>>,
}

impl Expiration {
    /// Session cookies for every key
    pub fn session() -> Self {
        Self::default()
    }

    /// Every key expires after `ttl` unless overridden
    pub fn after(ttl: Ttl) -> Self {
        Self {
            default: Some(ttl),
            overrides: HashMap::new(),
        }
    }

    /// Override the policy for one key. `None` makes it a session cookie.
    pub fn with_override(mut self, key: impl Into<String>, ttl: Option<Ttl>) -> Self {
        self.overrides.insert(key.into(), ttl);
        self
    }

    pub fn overrides(&self) -> &HashMap<String, Option<Ttl>> {
        &self.overrides
    }

    /// TTL for an entry cookie, `None` for a session cookie
    pub fn resolve(&self, key: &str) -> Option<Ttl> {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or(self.default)
            .filter(|ttl| !ttl.is_session())
    }

    /// TTL for the index cookie, which always follows the default policy
    pub fn index_ttl(&self) -> Option<Ttl> {
        self.default.filter(|ttl| !ttl.is_session())
    }
}

/// Storage configuration
#[derive(Debug, Clone, bon::Builder)]
pub struct StorageOptions {
    /// Prepended to every key when naming its cookie
    #[builder(default, into)]
    pub key_prefix: String,
    /// Cookie holding the JSON list of keys
    #[builder(default = DEFAULT_INDEX_KEY.to_string(), into)]
    pub index_key: String,
    #[builder(default)]
    pub expiration: Expiration,
    /// Attributes passed through on every cookie write
    #[builder(default)]
    pub set_cookie_options: CookieOptions,
    /// Queue index updates so concurrent writers never drop keys
    #[builder(default)]
    pub serialize_index_writes: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StorageOptions {
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let mut expiration = Expiration {
            default: settings.expiration.default,
            overrides: HashMap::new(),
        };
        for (key, ttl) in &settings.expiration.keys {
            expiration = expiration.with_override(key.clone(), Some(*ttl));
        }

        Self {
            key_prefix: settings.key_prefix.clone(),
            index_key: settings.index_key.clone(),
            expiration,
            set_cookie_options: settings.cookie.clone(),
            serialize_index_writes: settings.serialize_index_writes,
        }
    }
}

/// Key-value storage over an injected cookie jar
#[derive(Clone)]
pub struct CookieStorage {
    jar: Arc<dyn CookieJar>,
    options: Arc<StorageOptions>,
    metrics: Arc<Metrics>,
    index_queue: Option<Arc<Mutex<()>>>,
}

impl std::fmt::Debug for CookieStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStorage")
            .field("options", &self.options)
            .finish()
    }
}

impl CookieStorage {
    /// Create a storage over any jar implementation
    pub fn new(jar: Arc<dyn CookieJar>, options: StorageOptions) -> Self {
        let index_queue = options
            .serialize_index_writes
            .then(|| Arc::new(Mutex::new(())));

        Self {
            jar,
            options: Arc::new(options),
            metrics: Arc::new(Metrics::new()),
            index_queue,
        }
    }

    /// Create a storage backed by a fresh in-memory jar with expiry timers
    pub fn in_memory(options: StorageOptions) -> Self {
        Self::new(Arc::new(MemoryJar::new()), options)
    }

    /// Create a storage over a raw name/value mapping (no TTL support)
    pub fn from_map(map: HashMap<String, String>, options: StorageOptions) -> Self {
        Self::new(Arc::new(MapJar::new(map)), options)
    }

    /// Create a storage from loaded configuration
    pub fn from_settings(jar: Arc<dyn CookieJar>, settings: &StorageSettings) -> Self {
        Self::new(jar, StorageOptions::from_settings(settings))
    }

    /// Record into a shared metrics handle instead of a private one
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Cookie name for `key`, refusing names that would land on the index
    fn entry_name(&self, key: &str) -> Result<String> {
        let name = format!("{}{}", self.options.key_prefix, key);
        if name == self.options.index_key {
            return Err(StorageError::ReservedKey(key.to_string()));
        }
        Ok(name)
    }

    async fn lock_index(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.index_queue {
            Some(queue) => Some(queue.lock().await),
            None => None,
        }
    }

    /// Read one entry
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let name = format!("{}{}", self.options.key_prefix, key);
        let value = self.jar.get(&name).await?;
        self.metrics.item_read();

        debug!(key, cookie = %name, found = value.is_some(), "Read item");
        Ok(value)
    }

    /// Write one entry, then register its key in the index
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let name = self.entry_name(key)?;

        let ttl = self.options.expiration.resolve(key);
        let options = self.options.set_cookie_options.with_expiry(ttl);
        self.jar.set(&name, value, &options).await?;
        self.metrics.item_written();

        debug!(
            key,
            cookie = %name,
            ttl = ?ttl.map(|ttl| ttl.as_secs()),
            size = value.len(),
            "Wrote item"
        );

        let _queued = self.lock_index().await;
        let mut keys = self.get_all_keys().await?;
        if !keys.iter().any(|existing| existing == key) {
            keys.push(key.to_string());
            self.write_index(&keys).await?;
        }

        Ok(())
    }

    /// Expire one entry, then drop its key from the index
    pub async fn remove_item(&self, key: &str) -> Result<()> {
        let name = self.entry_name(key)?;
        self.jar.expire(&name).await?;
        self.metrics.item_removed();

        debug!(key, cookie = %name, "Removed item");

        let _queued = self.lock_index().await;
        let keys: Vec<String> = self
            .get_all_keys()
            .await?
            .into_iter()
            .filter(|existing| existing != key)
            .collect();
        self.write_index(&keys).await?;

        Ok(())
    }

    /// Keys registered in the index, in first-insertion order
    pub async fn get_all_keys(&self) -> Result<Vec<String>> {
        let index_key = &self.options.index_key;

        let raw = match self.jar.get(index_key).await? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };

        serde_json::from_str::<Vec<String>>(&raw).map_err(|source| {
            self.metrics.corrupt_index();
            warn!(index_key = %index_key, error = %source, "Index cookie is corrupt");
            StorageError::CorruptIndex {
                index_key: index_key.clone(),
                source,
            }
        })
    }

    async fn write_index(&self, keys: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(keys)?;
        let options = self
            .options
            .set_cookie_options
            .with_expiry(self.options.expiration.index_ttl());

        self.jar
            .set(&self.options.index_key, &encoded, &options)
            .await?;
        self.metrics.index_written();

        debug!(index_key = %self.options.index_key, count = keys.len(), "Wrote index");
        Ok(())
    }
}

#[async_trait]
impl PersistStorage for CookieStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        CookieStorage::get_item(self, key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        CookieStorage::set_item(self, key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        CookieStorage::remove_item(self, key).await
    }

    async fn get_all_keys(&self) -> Result<Vec<String>> {
        CookieStorage::get_all_keys(self).await
    }
}
