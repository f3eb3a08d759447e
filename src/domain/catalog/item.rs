//! Catalog item record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// An upstream item imported into the local catalog.
///
/// `source_id` is the upstream identifier; `target_id` is the local record
/// the item was imported into. The sync engine refreshes these fields from
/// the provider over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Upstream identifier.
    pub source_id: String,

    /// Local record identifier the item is bound to.
    pub target_id: u64,

    /// Display title.
    pub title: String,

    /// Current price in minor units, if known.
    pub price_cents: Option<i64>,

    /// ISO currency code for `price_cents`.
    pub currency: Option<String>,

    /// Canonical upstream URL.
    pub url: Option<String>,

    /// Primary image URL.
    pub image_url: Option<String>,

    /// When the item was last refreshed from upstream.
    pub last_refreshed_at: Option<Timestamp>,
}

impl CatalogItem {
    /// Creates a minimal item bound to a local record.
    pub fn new(source_id: impl Into<String>, target_id: u64, title: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id,
            title: title.into(),
            price_cents: None,
            currency: None,
            url: None,
            image_url: None,
            last_refreshed_at: None,
        }
    }

    /// Absorbs freshly fetched upstream fields, stamping the refresh time.
    ///
    /// The binding (`source_id`/`target_id`) is preserved; only upstream
    /// data moves.
    pub fn apply_refresh(&mut self, fetched: &CatalogItem) {
        self.title = fetched.title.clone();
        self.price_cents = fetched.price_cents;
        self.currency = fetched.currency.clone();
        self.url = fetched.url.clone();
        self.image_url = fetched.image_url.clone();
        self.last_refreshed_at = Some(Timestamp::now());
    }
}
