//! JSON document parser.
//!
//! Default [`DocumentParser`] for upstream endpoints that serve structured
//! JSON. Markup-scraping parsers plug in behind the same port.

use serde::Deserialize;

use crate::domain::catalog::CatalogItem;
use crate::ports::{DocumentParser, ParseError};

/// Wire shape of a single item document.
#[derive(Debug, Deserialize)]
struct RawItem {
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
struct RawListing {
    items: Vec<RawItem>,
}

impl From<RawItem> for CatalogItem {
    fn from(raw: RawItem) -> Self {
        let mut item = CatalogItem::new(raw.id, 0, raw.title);
        item.price_cents = raw.price_cents;
        item.currency = raw.currency;
        item.url = raw.url;
        item.image_url = raw.image_url;
        item
    }
}

/// Parser for JSON item documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonItemParser;

impl JsonItemParser {
    /// Creates the parser.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for JsonItemParser {
    fn parse_item(&self, body: &[u8]) -> Result<CatalogItem, ParseError> {
        let raw: RawItem =
            serde_json::from_slice(body).map_err(|e| ParseError::Malformed(e.to_string()))?;
        if raw.id.is_empty() {
            return Err(ParseError::MissingField("id"));
        }
        Ok(raw.into())
    }

    fn parse_listing(&self, body: &[u8]) -> Result<Vec<CatalogItem>, ParseError> {
        let raw: RawListing =
            serde_json::from_slice(body).map_err(|e| ParseError::Malformed(e.to_string()))?;
        Ok(raw.items.into_iter().map(CatalogItem::from).collect())
    }
}
