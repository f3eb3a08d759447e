//! Key/value store port.
//!
//! The durable contract every service persists through: licenses, the active
//! run's queue snapshot, run stats, and the capped logs all live behind
//! `get`/`set`/`delete` by string key. `keys_with_prefix` supports the scans
//! the ledger queries and the sync snapshot need.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Errors from the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A value could not be (de)serialized.
    #[error("serialization failed for key '{key}': {reason}")]
    Serialization { key: String, reason: String },

    /// The backing medium failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// I/O failure on a file-backed store.
    #[error("io error: {0}")]
    Io(String),
}

/// Port for durable key/value persistence.
///
/// Implementations must apply each `set` atomically per key; the contract
/// is last-write-wins across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value at `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes `value` at `key`, replacing any existing value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes the value at `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Typed access on top of the raw JSON contract.
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and deserializes the value at `key`.
    async fn get_typed<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Serializes and writes `value` at `key`.
    async fn set_typed<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync,
    {
        let json = serde_json::to_value(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set(key, json).await
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
