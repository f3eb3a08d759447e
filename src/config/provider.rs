//! Provider configuration.

use secrecy::SecretString;
use serde::Deserialize;

use crate::adapters::provider::{DeploymentMode, ProviderSettings};
use crate::domain::catalog::Region;

use super::error::ValidationError;

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Deployment mode: `server` or `client`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Strategy key for server mode (`direct`, `aggregate_api`,
    /// `official_api`).
    #[serde(default)]
    pub strategy: Option<String>,

    /// Marketplace region code.
    #[serde(default = "default_region")]
    pub region: String,

    /// Host stem for direct retail-site fetches.
    #[serde(default = "default_site_root")]
    pub site_root: String,

    /// Aggregation API base URL.
    #[serde(default = "default_aggregate_base_url")]
    pub aggregate_base_url: String,

    /// Aggregation API key.
    #[serde(default)]
    pub aggregate_api_key: Option<String>,

    /// Aggregation cache TTL in seconds.
    #[serde(default = "default_aggregate_cache_ttl_secs")]
    pub aggregate_cache_ttl_secs: u64,

    /// Official API endpoint.
    #[serde(default = "default_official_endpoint")]
    pub official_endpoint: String,

    /// Official API access key id.
    #[serde(default)]
    pub official_access_key: Option<String>,

    /// Official API signing secret.
    #[serde(default)]
    pub official_secret_key: Option<String>,

    /// Official API partner tag.
    #[serde(default)]
    pub official_partner_tag: Option<String>,

    /// Remote gateway peer base URL (client mode).
    #[serde(default = "default_gateway_base_url")]
    pub gateway_base_url: String,

    /// License key presented to the remote gateway.
    #[serde(default)]
    pub gateway_license_key: Option<String>,
}

fn default_mode() -> String {
    "server".to_string()
}

fn default_region() -> String {
    "us".to_string()
}

fn default_site_root() -> String {
    "www.example-shop".to_string()
}

fn default_aggregate_base_url() -> String {
    "https://api.aggregator.example".to_string()
}

fn default_aggregate_cache_ttl_secs() -> u64 {
    900
}

fn default_official_endpoint() -> String {
    "https://api.partner.example".to_string()
}

fn default_gateway_base_url() -> String {
    "https://gateway.example".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            strategy: None,
            region: default_region(),
            site_root: default_site_root(),
            aggregate_base_url: default_aggregate_base_url(),
            aggregate_api_key: None,
            aggregate_cache_ttl_secs: default_aggregate_cache_ttl_secs(),
            official_endpoint: default_official_endpoint(),
            official_access_key: None,
            official_secret_key: None,
            official_partner_tag: None,
            gateway_base_url: default_gateway_base_url(),
            gateway_license_key: None,
        }
    }
}

impl ProviderConfig {
    /// Parsed deployment mode.
    pub fn mode(&self) -> DeploymentMode {
        DeploymentMode::from_code(&self.mode)
    }

    /// Selector settings derived from this configuration, secrets wrapped.
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            mode: self.mode(),
            strategy: self.strategy.clone(),
            region: Region::from_code(&self.region),
            site_root: self.site_root.clone(),
            aggregate_base_url: self.aggregate_base_url.clone(),
            aggregate_api_key: self.aggregate_api_key.clone().map(SecretString::new),
            aggregate_cache_ttl_secs: self.aggregate_cache_ttl_secs,
            official_endpoint: self.official_endpoint.clone(),
            official_access_key: self.official_access_key.clone(),
            official_secret_key: self.official_secret_key.clone().map(SecretString::new),
            official_partner_tag: self.official_partner_tag.clone(),
            gateway_base_url: self.gateway_base_url.clone(),
            gateway_license_key: self.gateway_license_key.clone().map(SecretString::new),
        }
    }

    /// Validate provider configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mode() == DeploymentMode::Client && self.gateway_license_key.is_none() {
            return Err(ValidationError::MissingRequired(
                "SYNCGATE__PROVIDER__GATEWAY_LICENSE_KEY",
            ));
        }
        for (url, name) in [
            (&self.aggregate_base_url, "aggregate_base_url"),
            (&self.official_endpoint, "official_endpoint"),
            (&self.gateway_base_url, "gateway_base_url"),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBaseUrl(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_server_mode() {
        let config = ProviderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode(), DeploymentMode::Server);
    }

    #[test]
    fn client_mode_requires_a_license_key() {
        let config = ProviderConfig {
            mode: "client".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));

        let config = ProviderConfig {
            mode: "client".to_string(),
            gateway_license_key: Some("sg_abc".to_string()),
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let config = ProviderConfig {
            aggregate_base_url: "ftp://wrong".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl("aggregate_base_url"))
        ));
    }

    #[test]
    fn settings_carry_mode_and_region() {
        let config = ProviderConfig {
            mode: "client".to_string(),
            region: "de".to_string(),
            gateway_license_key: Some("sg_abc".to_string()),
            ..ProviderConfig::default()
        };
        let settings = config.settings();
        assert_eq!(settings.mode, DeploymentMode::Client);
        assert_eq!(settings.region, Region::De);
        assert!(settings.gateway_license_key.is_some());
    }
}
