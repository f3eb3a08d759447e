//! Storage configuration.

use serde::Deserialize;

/// Key/value store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory the file-backed store writes into.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
