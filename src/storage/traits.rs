use async_trait::async_trait;

use super::StorageError;

/// Four-operation persistence contract consumed by a state-persistence layer
///
/// Values are opaque strings: callers serialize structured state before
/// calling `set_item` and parse it after `get_item`.
#[async_trait]
pub trait PersistStorage: Send + Sync {
    /// Read one entry, `None` if it was never written or has expired
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write one entry and register its key
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete one entry and unregister its key
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All registered keys in first-insertion order
    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError>;
}
