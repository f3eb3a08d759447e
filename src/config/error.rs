//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Cycle start day must be between 1 and 28")]
    InvalidCycleStartDay,

    #[error("Gigabyte limit must be positive")]
    InvalidGbLimit,

    #[error("Rate limit window must be at least one second")]
    InvalidRateLimitWindow,

    #[error("Per-item sync delay must be at least one second")]
    InvalidItemDelay,

    #[error("Max retries must be at least 1")]
    InvalidMaxRetries,

    #[error("Request timeout must be at least one second")]
    InvalidTimeout,

    #[error("Invalid base URL for {0}")]
    InvalidBaseUrl(&'static str),
}
