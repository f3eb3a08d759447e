//! Sync engine configuration.

use serde::Deserialize;

use crate::application::SyncEngineConfig;
use crate::domain::sync::SyncFrequency;

use super::error::ValidationError;

/// Sync engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Run cadence code (`off`, `daily`, `every_3_days`, `weekly`,
    /// `every_14_days`).
    #[serde(default = "default_frequency")]
    pub frequency: String,

    /// Delay before the first tick of a run, in seconds.
    #[serde(default = "default_first_tick_delay_secs")]
    pub first_tick_delay_secs: u64,

    /// Fixed delay between items, in seconds.
    #[serde(default = "default_item_delay_secs")]
    pub item_delay_secs: u64,

    /// Attempts per item before it is marked failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-call upstream timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_frequency() -> String {
    "daily".to_string()
}

fn default_first_tick_delay_secs() -> u64 {
    10
}

fn default_item_delay_secs() -> u64 {
    40
}

fn default_max_retries() -> u32 {
    2
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            first_tick_delay_secs: default_first_tick_delay_secs(),
            item_delay_secs: default_item_delay_secs(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SyncConfig {
    /// Parsed run cadence.
    pub fn frequency(&self) -> SyncFrequency {
        SyncFrequency::from_code(&self.frequency)
    }

    /// Engine tuning derived from this configuration.
    pub fn engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            first_tick_delay_secs: self.first_tick_delay_secs,
            item_delay_secs: self.item_delay_secs,
            max_retries: self.max_retries,
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    /// Validate sync configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.item_delay_secs == 0 {
            return Err(ValidationError::InvalidItemDelay);
        }
        if self.max_retries == 0 {
            return Err(ValidationError::InvalidMaxRetries);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}
