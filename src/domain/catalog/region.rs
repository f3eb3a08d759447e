//! Upstream marketplace regions.

use serde::{Deserialize, Serialize};

/// Marketplace region an upstream call targets.
///
/// Providers map a region to the hostname they talk to; see
/// `DataProvider::domain_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Uk,
    De,
    Fr,
    It,
    Es,
    Ca,
    Jp,
}

impl Region {
    /// Two-letter code used in configuration and URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Uk => "uk",
            Region::De => "de",
            Region::Fr => "fr",
            Region::It => "it",
            Region::Es => "es",
            Region::Ca => "ca",
            Region::Jp => "jp",
        }
    }

    /// Parses a configuration code, defaulting unknown values to `Us`.
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "uk" | "gb" => Region::Uk,
            "de" => Region::De,
            "fr" => Region::Fr,
            "it" => Region::It,
            "es" => Region::Es,
            "ca" => Region::Ca,
            "jp" => Region::Jp,
            _ => Region::Us,
        }
    }

    /// Top-level-domain suffix for retail-site hosts.
    pub fn tld(&self) -> &'static str {
        match self {
            Region::Us => "com",
            Region::Uk => "co.uk",
            Region::De => "de",
            Region::Fr => "fr",
            Region::It => "it",
            Region::Es => "es",
            Region::Ca => "ca",
            Region::Jp => "co.jp",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
