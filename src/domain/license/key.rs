//! License key value object.
//!
//! The key is the secret credential a caller presents to the gateway.
//! Comparison is constant-time so that key lookup cannot be used as a
//! timing oracle.

use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

/// Prefix identifying syncgate-issued keys.
const KEY_PREFIX: &str = "sg_";

/// Secret credential identifying a license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(format!("{}{}", KEY_PREFIX, Uuid::new_v4().simple()))
    }

    /// Wraps an existing key string, validating its shape.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("license_key"));
        }
        if !raw.starts_with(KEY_PREFIX) {
            return Err(ValidationError::invalid_format(
                "license_key",
                format!("must start with '{KEY_PREFIX}'"),
            ));
        }
        Ok(Self(raw))
    }

    /// Constant-time equality against a presented credential.
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    /// Returns the raw key string.
    ///
    /// Only for persistence and for handing the key to its owner once.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Redacted form safe for log lines: prefix plus last four characters.
    pub fn redacted(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{KEY_PREFIX}…{tail}")
    }
}

impl PartialEq for LicenseKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for LicenseKey {}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display is intentionally redacted; use expose() for the raw key.
        write!(f, "{}", self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_prefix_and_are_unique() {
        let a = LicenseKey::generate();
        let b = LicenseKey::generate();
        assert!(a.expose().starts_with("sg_"));
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn parse_accepts_wellformed_keys() {
        let key = LicenseKey::parse("sg_0123456789abcdef").unwrap();
        assert!(key.matches("sg_0123456789abcdef"));
    }

    #[test]
    fn parse_rejects_empty_and_unprefixed() {
        assert!(LicenseKey::parse("").is_err());
        assert!(LicenseKey::parse("api_123").is_err());
    }

    #[test]
    fn matches_rejects_different_key() {
        let key = LicenseKey::generate();
        assert!(!key.matches("sg_not_the_key"));
    }

    #[test]
    fn display_redacts_the_secret() {
        let key = LicenseKey::parse("sg_0123456789abcdef").unwrap();
        let shown = format!("{key}");
        assert!(!shown.contains("0123456789ab"));
        assert!(shown.ends_with("cdef"));
    }
}
