//! Usage events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{LicenseId, Timestamp};

/// Append-only record of one metered request.
///
/// Retention is capped by the ledger; old entries are dropped from the
/// front of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the request was recorded.
    pub occurred_at: Timestamp,
    /// License that consumed the quota.
    pub license_id: LicenseId,
    /// Logical endpoint that was called.
    pub endpoint: String,
    /// Bytes charged (after the per-request clamp).
    pub bytes: u64,
    /// Where the request originated (site host, peer name).
    pub origin: String,
    /// Free-form context for diagnostics.
    pub metadata: HashMap<String, String>,
}

impl UsageEvent {
    /// Creates an event stamped now.
    pub fn new(
        license_id: LicenseId,
        endpoint: impl Into<String>,
        bytes: u64,
        origin: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            occurred_at: Timestamp::now(),
            license_id,
            endpoint: endpoint.into(),
            bytes,
            origin: origin.into(),
            metadata,
        }
    }
}
