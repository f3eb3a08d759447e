//! Mock data provider for testing.
//!
//! Configurable to return canned items, fail specific identifiers, or
//! simulate upstream latency for timeout testing. Records every call for
//! verification.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::catalog::{CatalogItem, Region};
use crate::ports::{DataProvider, ItemPage, ProviderError};

/// Scripted provider double.
#[derive(Debug, Default)]
pub struct MockDataProvider {
    items: Mutex<HashMap<String, CatalogItem>>,
    failing: Mutex<HashSet<String>>,
    missing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl MockDataProvider {
    /// A provider that answers every lookup with a generated item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cans a specific item for its identifier.
    pub fn with_item(self, item: CatalogItem) -> Self {
        if let Ok(mut items) = self.items.lock() {
            items.insert(item.source_id.clone(), item);
        }
        self
    }

    /// Makes every fetch of `identifier` fail with an upstream error.
    pub fn with_failing(self, identifier: impl Into<String>) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(identifier.into());
        }
        self
    }

    /// Makes every fetch of `identifier` report not-found.
    pub fn with_missing(self, identifier: impl Into<String>) -> Self {
        if let Ok(mut missing) = self.missing.lock() {
            missing.insert(identifier.into());
        }
        self
    }

    /// Adds simulated latency to every call.
    pub fn with_delay(self, delay: Duration) -> Self {
        if let Ok(mut slot) = self.delay.lock() {
            *slot = Some(delay);
        }
        self
    }

    /// Identifiers fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of fetches so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            sleep(delay).await;
        }
    }

    fn record_call(&self, identifier: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(identifier.to_string());
        }
    }
}

#[async_trait]
impl DataProvider for MockDataProvider {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<ItemPage, ProviderError> {
        self.record_call(&format!("search:{keyword}"));
        self.simulate_latency().await;
        let items = self
            .items
            .lock()
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default();
        Ok(ItemPage {
            items,
            page,
            total_pages: Some(1),
        })
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<CatalogItem, ProviderError> {
        self.record_call(identifier);
        self.simulate_latency().await;

        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(identifier))
            .unwrap_or(false);
        if failing {
            return Err(ProviderError::Upstream {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }

        let missing = self
            .missing
            .lock()
            .map(|m| m.contains(identifier))
            .unwrap_or(false);
        if missing {
            return Err(ProviderError::NotFound(identifier.to_string()));
        }

        let canned = self
            .items
            .lock()
            .ok()
            .and_then(|items| items.get(identifier).cloned());
        Ok(canned.unwrap_or_else(|| {
            CatalogItem::new(identifier, 0, format!("Item {identifier}"))
        }))
    }

    async fn list_current_offers(&self, page: u32) -> Result<ItemPage, ProviderError> {
        self.record_call("offers");
        self.simulate_latency().await;
        Ok(ItemPage::empty(page))
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn domain_for(&self, region: Region) -> String {
        format!("mock.{}", region.tld())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_items_by_default() {
        let provider = MockDataProvider::new();
        let item = provider.get_by_identifier("B0GEN").await.unwrap();
        assert_eq!(item.source_id, "B0GEN");
    }

    #[tokio::test]
    async fn canned_items_take_precedence() {
        let mut canned = CatalogItem::new("B0CAN", 5, "Canned");
        canned.price_cents = Some(999);
        let provider = MockDataProvider::new().with_item(canned);

        let item = provider.get_by_identifier("B0CAN").await.unwrap();
        assert_eq!(item.price_cents, Some(999));
    }

    #[tokio::test]
    async fn scripted_failures_and_missing_items() {
        let provider = MockDataProvider::new()
            .with_failing("bad")
            .with_missing("gone");

        assert!(matches!(
            provider.get_by_identifier("bad").await,
            Err(ProviderError::Upstream { status: 503, .. })
        ));
        assert!(matches!(
            provider.get_by_identifier("gone").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn records_calls_in_order() {
        let provider = MockDataProvider::new();
        provider.get_by_identifier("a").await.unwrap();
        provider.get_by_identifier("b").await.unwrap();
        assert_eq!(provider.calls(), vec!["a", "b"]);
        assert_eq!(provider.call_count(), 2);
    }
}
