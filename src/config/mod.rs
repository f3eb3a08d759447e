//! Application configuration module.
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `SYNCGATE`
//! prefix and `__` (double underscore) as the nesting separator:
//!
//! - `SYNCGATE__GATEWAY__GB_LIMIT=10` -> `gateway.gb_limit = 10.0`
//! - `SYNCGATE__PROVIDER__MODE=client` -> `provider.mode = "client"`

mod error;
mod gateway;
mod provider;
mod storage;
mod sync;

pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use provider::ProviderConfig;
pub use storage::StorageConfig;
pub use sync::SyncConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Quota gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Upstream provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sync engine settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file first when present (development), then reads
    /// `SYNCGATE`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when values cannot be parsed into the typed
    /// sections.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SYNCGATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every configuration section.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.gateway.validate()?;
        self.provider.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
