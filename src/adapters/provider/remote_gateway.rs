//! Remote gateway proxy strategy.
//!
//! Client-mode deployments hold no upstream credentials of their own; every
//! call is forwarded to a central gateway peer that implements the identical
//! provider interface and does its own admission control. The caller
//! authenticates with its license key.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::domain::catalog::{CatalogItem, Region};
use crate::ports::{DataProvider, ItemPage, ProviderError};

use super::ProviderSettings;

const HTTP_TIMEOUT_SECS: u64 = 30;

/// Proxy forwarding every call to a gateway peer.
pub struct RemoteGatewayProvider {
    client: reqwest::Client,
    base_url: String,
    license_key: Option<SecretString>,
}

impl RemoteGatewayProvider {
    /// Creates a proxy against the peer at `base_url`.
    pub fn new(base_url: impl Into<String>, license_key: Option<SecretString>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            license_key,
        }
    }

    /// Builds the proxy from selector settings.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            settings.gateway_base_url.clone(),
            settings.gateway_license_key.clone(),
        )
    }

    async fn forward<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, ProviderError> {
        let key = self
            .license_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("gateway license key missing"))?;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path_and_query))
            .header("X-License-Key", key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(path_and_query.to_string()));
        }
        if !status.is_success() {
            // The peer's admission rejections (invalid license, quota,
            // rate limit) surface here as upstream errors.
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataProvider for RemoteGatewayProvider {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<ItemPage, ProviderError> {
        self.forward(&format!("/v1/search?keyword={keyword}&page={page}"))
            .await
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<CatalogItem, ProviderError> {
        self.forward(&format!("/v1/items/{identifier}")).await
    }

    async fn list_current_offers(&self, page: u32) -> Result<ItemPage, ProviderError> {
        // Offer listing is served only by the gateway side itself; client
        // deployments get an empty page. Documented limitation, not an
        // error.
        Ok(ItemPage::empty(page))
    }

    fn is_configured(&self) -> bool {
        self.license_key.is_some()
    }

    fn provider_name(&self) -> &'static str {
        "remote-gateway"
    }

    fn domain_for(&self, _region: Region) -> String {
        host_of(&self.base_url)
    }
}

fn host_of(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
