//! Data provider port.
//!
//! The upstream fetch capability every access strategy implements: direct
//! retail-site fetching, aggregation APIs, the officially signed API, and
//! the remote gateway proxy all expose this same interface, so calling code
//! never branches on deployment mode.

use async_trait::async_trait;

use crate::domain::catalog::{CatalogItem, Region};

/// One page of items from an upstream listing or search.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemPage {
    /// Items on this page.
    pub items: Vec<CatalogItem>,
    /// Page number requested (1-based).
    pub page: u32,
    /// Total pages upstream reports, when known.
    pub total_pages: Option<u32>,
}

impl ItemPage {
    /// An empty page, e.g. for capabilities a deployment mode cannot serve.
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            total_pages: Some(0),
        }
    }
}

/// Errors from upstream access.
///
/// Failure surfaces as an empty result or a typed error, never a partial
/// success.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The strategy lacks required configuration (credentials, endpoint).
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),

    /// Upstream knows nothing under this identifier.
    #[error("item not found upstream: {0}")]
    NotFound(String),

    /// Upstream answered with a failure status.
    #[error("upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The connection itself failed.
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be decoded into item records.
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// The bounded per-call timeout elapsed.
    #[error("upstream call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl ProviderError {
    /// Whether a retry at a later tick could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_)
                | ProviderError::Timeout { .. }
                | ProviderError::Upstream { status: 500..=599, .. }
                | ProviderError::Upstream { status: 429, .. }
        )
    }
}

/// Port for fetching structured item records from the upstream source.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Searches upstream by keyword, returning one result page.
    async fn search_by_keyword(&self, keyword: &str, page: u32)
        -> Result<ItemPage, ProviderError>;

    /// Fetches a single item by its upstream identifier.
    async fn get_by_identifier(&self, identifier: &str) -> Result<CatalogItem, ProviderError>;

    /// Lists currently discounted offers.
    ///
    /// Only meaningful server-side; client mode returns an empty page.
    async fn list_current_offers(&self, page: u32) -> Result<ItemPage, ProviderError>;

    /// Whether the strategy has everything it needs to make calls.
    fn is_configured(&self) -> bool;

    /// Stable strategy name for logs and diagnostics.
    fn provider_name(&self) -> &'static str;

    /// Hostname this strategy targets for the given region.
    fn domain_for(&self, region: Region) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_no_items() {
        let page = ItemPage::empty(3);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, Some(0));
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Timeout { timeout_secs: 15 }.is_transient());
        assert!(ProviderError::Network("reset".to_string()).is_transient());
        assert!(ProviderError::Upstream { status: 503, message: String::new() }.is_transient());
        assert!(ProviderError::Upstream { status: 429, message: String::new() }.is_transient());
        assert!(!ProviderError::NotFound("B0X".to_string()).is_transient());
        assert!(!ProviderError::Upstream { status: 404, message: String::new() }.is_transient());
    }
}
