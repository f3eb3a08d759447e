//! File-backed key/value store.
//!
//! One JSON file per key under a base directory. Writes go through a
//! temporary file and rename so readers never observe a half-written value.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{KeyValueStore, StoreError};

const FILE_EXT: &str = "json";

/// Durable file-per-key store.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `base_path`. The directory is created on
    /// first write.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    // Keys use ':' as a namespace separator, which is not portable in file
    // names. '::' never appears in our keys, so '__' is a safe encoding.
    fn encode_key(key: &str) -> String {
        key.replace(':', "__")
    }

    fn decode_file_name(name: &str) -> Option<String> {
        let stem = name.strip_suffix(&format!(".{FILE_EXT}"))?;
        Some(stem.replace("__", ":"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.{FILE_EXT}", Self::encode_key(key)))
    }

    async fn ensure_base_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_base_dir().await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");

        let raw = serde_json::to_string_pretty(&value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut dir = match fs::read_dir(&self.base_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = Self::decode_file_name(name) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
