//! Third-party aggregation API strategy.
//!
//! Talks to a commercial aggregator that exposes upstream catalog data as
//! JSON. Responses are cached for a configurable TTL so repeated lookups in
//! one window do not burn quota twice.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::catalog::{CatalogItem, Region};
use crate::domain::foundation::Timestamp;
use crate::ports::{DataProvider, ItemPage, ProviderError};

use super::ProviderSettings;

const HTTP_TIMEOUT_SECS: u64 = 30;

/// TTL cache keyed by request URL.
struct ResponseCache<T> {
    ttl_secs: u64,
    entries: Mutex<HashMap<String, (u64, T)>>,
}

impl<T: Clone> ResponseCache<T> {
    fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<T> {
        let now = Timestamp::now().as_unix_secs();
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|(stored_at, _)| now < stored_at + self.ttl_secs)
            .map(|(_, value)| value.clone())
    }

    fn put(&self, key: String, value: T) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, (Timestamp::now().as_unix_secs(), value));
        }
    }
}

/// Wire shapes of the aggregator's responses.
#[derive(Debug, Deserialize)]
struct ApiItem {
    id: String,
    title: String,
    #[serde(default)]
    price_cents: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiListing {
    items: Vec<ApiItem>,
    #[serde(default)]
    total_pages: Option<u32>,
}

impl From<ApiItem> for CatalogItem {
    fn from(api: ApiItem) -> Self {
        let mut item = CatalogItem::new(api.id, 0, api.title);
        item.price_cents = api.price_cents;
        item.currency = api.currency;
        item.url = api.url;
        item.image_url = api.image_url;
        item
    }
}

/// Aggregation API client.
pub struct AggregateApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    item_cache: ResponseCache<CatalogItem>,
    page_cache: ResponseCache<ItemPage>,
}

impl AggregateApiProvider {
    /// Creates a client against `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>, ttl_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key,
            item_cache: ResponseCache::new(ttl_secs),
            page_cache: ResponseCache::new(ttl_secs),
        }
    }

    /// Builds the provider from selector settings.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            settings.aggregate_base_url.clone(),
            settings.aggregate_api_key.clone(),
            settings.aggregate_cache_ttl_secs,
        )
    }

    fn require_key(&self) -> Result<&SecretString, ProviderError> {
        self.api_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("aggregation API key missing"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ProviderError> {
        let key = self.require_key()?;
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url.to_string()));
        }
        if !status.is_success() {
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

    async fn fetch_page(&self, url: String, page: u32) -> Result<ItemPage, ProviderError> {
        if let Some(cached) = self.page_cache.get(&url) {
            return Ok(cached);
        }
        let listing: ApiListing = self.get_json(&url).await?;
        let result = ItemPage {
            items: listing.items.into_iter().map(CatalogItem::from).collect(),
            page,
            total_pages: listing.total_pages,
        };
        self.page_cache.put(url, result.clone());
        Ok(result)
    }
}

#[async_trait]
impl DataProvider for AggregateApiProvider {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<ItemPage, ProviderError> {
        let url = format!("{}/v2/search?q={}&page={}", self.base_url, keyword, page);
        self.fetch_page(url, page).await
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<CatalogItem, ProviderError> {
        let url = format!("{}/v2/items/{}", self.base_url, identifier);
        if let Some(cached) = self.item_cache.get(&url) {
            return Ok(cached);
        }
        let api_item: ApiItem = self.get_json(&url).await?;
        let item = CatalogItem::from(api_item);
        self.item_cache.put(url, item.clone());
        Ok(item)
    }

    async fn list_current_offers(&self, page: u32) -> Result<ItemPage, ProviderError> {
        let url = format!("{}/v2/offers?page={}", self.base_url, page);
        self.fetch_page(url, page).await
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn provider_name(&self) -> &'static str {
        "aggregate-api"
    }

    fn domain_for(&self, _region: Region) -> String {
        // The aggregator serves every region from one host.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_without_api_key() {
        let provider = AggregateApiProvider::new("https://api.aggregator.example", None, 900);
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn calls_without_key_fail_fast() {
        let provider = AggregateApiProvider::new("https://api.aggregator.example", None, 900);
        let result = provider.get_by_identifier("B0X").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn domain_is_the_api_host_for_every_region() {
        let provider = AggregateApiProvider::new("https://api.aggregator.example/base", None, 900);
        assert_eq!(provider.domain_for(Region::De), "api.aggregator.example");
        assert_eq!(provider.domain_for(Region::Jp), "api.aggregator.example");
    }

    #[test]
    fn cache_returns_fresh_entries_and_expires_old_ones() {
        let cache: ResponseCache<u32> = ResponseCache::new(60);
        cache.put("k".to_string(), 7);
        assert_eq!(cache.get("k"), Some(7));

        let expired: ResponseCache<u32> = ResponseCache::new(0);
        expired.put("k".to_string(), 7);
        assert_eq!(expired.get("k"), None);
    }
}
