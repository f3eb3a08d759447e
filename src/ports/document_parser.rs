//! Document parser port.
//!
//! Turning fetched bytes into item records is a separate concern from
//! fetching them; the direct-fetch strategy delegates here so markup
//! details stay out of the gateway core.

use crate::domain::catalog::CatalogItem;

/// Errors from response parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The document is not in the expected shape at all.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Port for extracting item records from fetched response bodies.
pub trait DocumentParser: Send + Sync {
    /// Parses a single-item document.
    fn parse_item(&self, body: &[u8]) -> Result<CatalogItem, ParseError>;

    /// Parses a listing/search-result document.
    fn parse_listing(&self, body: &[u8]) -> Result<Vec<CatalogItem>, ParseError>;
}
