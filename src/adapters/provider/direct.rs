//! Direct fetch-and-parse strategy.
//!
//! Fetches public retail-site documents and delegates extraction to a
//! [`DocumentParser`]. Needs no credentials, which makes it the server-mode
//! fallback, but it is also the most fragile strategy when upstream markup
//! changes.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::catalog::{CatalogItem, Region};
use crate::ports::{DataProvider, DocumentParser, ItemPage, ProviderError};

use super::{JsonItemParser, ProviderSettings};

const HTTP_TIMEOUT_SECS: u64 = 30;

/// Direct retail-site fetcher.
pub struct DirectFetchProvider {
    client: reqwest::Client,
    region: Region,
    site_root: String,
    parser: Arc<dyn DocumentParser>,
}

impl DirectFetchProvider {
    /// Creates a provider for `region` fetching from `site_root`.
    pub fn new(region: Region, site_root: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            region,
            site_root: site_root.into(),
            parser: Arc::new(JsonItemParser::new()),
        }
    }

    /// Builds the provider from selector settings.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(settings.region, settings.site_root.clone())
    }

    /// Replaces the document parser.
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    fn base_url(&self) -> String {
        format!("https://{}", self.domain_for(self.region))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
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

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DataProvider for DirectFetchProvider {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<ItemPage, ProviderError> {
        let url = format!(
            "{}/search?q={}&page={}",
            self.base_url(),
            urlencode(keyword),
            page
        );
        let body = self.fetch(&url).await?;
        let items = self
            .parser
            .parse_listing(&body)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(ItemPage {
            items,
            page,
            total_pages: None,
        })
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<CatalogItem, ProviderError> {
        let url = format!("{}/item/{}", self.base_url(), urlencode(identifier));
        let body = self.fetch(&url).await?;
        self.parser
            .parse_item(&body)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn list_current_offers(&self, page: u32) -> Result<ItemPage, ProviderError> {
        let url = format!("{}/deals?page={}", self.base_url(), page);
        let body = self.fetch(&url).await?;
        let items = self
            .parser
            .parse_listing(&body)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(ItemPage {
            items,
            page,
            total_pages: None,
        })
    }

    fn is_configured(&self) -> bool {
        // Public documents; nothing to configure.
        true
    }

    fn provider_name(&self) -> &'static str {
        "direct"
    }

    fn domain_for(&self, region: Region) -> String {
        format!("{}.{}", self.site_root, region.tld())
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
