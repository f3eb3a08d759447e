//! In-memory key/value store for testing and development.
//!
//! Not durable; suitable for tests and single-process experimentation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, StoreError};

/// In-memory implementation of the key/value port.
///
/// Thread-safe via `RwLock`; each `set` replaces the key atomically.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Useful in tests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::KeyValueStoreExt;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = InMemoryStore::new();
        store.set("a", json!({"n": 1})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"n": 1})));

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.delete("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn set_replaces_existing_value() {
        let store = InMemoryStore::new();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn prefix_scan_returns_sorted_matches() {
        let store = InMemoryStore::new();
        store.set("license:b", json!(1)).await.unwrap();
        store.set("license:a", json!(2)).await.unwrap();
        store.set("sync:queue", json!(3)).await.unwrap();

        let keys = store.keys_with_prefix("license:").await.unwrap();
        assert_eq!(keys, vec!["license:a", "license:b"]);
    }

    #[tokio::test]
    async fn typed_round_trip_via_extension() {
        let store = InMemoryStore::new();
        store.set_typed("nums", &vec![1u32, 2, 3]).await.unwrap();
        let back: Option<Vec<u32>> = store.get_typed("nums").await.unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn typed_get_reports_shape_mismatch() {
        let store = InMemoryStore::new();
        store.set("weird", json!("not a number")).await.unwrap();
        let result: Result<Option<u32>, _> = store.get_typed("weird").await;
        assert!(result.is_err());
    }
}
