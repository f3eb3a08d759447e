//! Rate limiting port.
//!
//! Short-window request-count cap per license, distinct from the long-window
//! volume quota. `check` is read-only so the gateway can evaluate admission
//! without consuming; `increment` is called only when a request is actually
//! recorded.

use async_trait::async_trait;

use crate::domain::foundation::{LicenseId, Timestamp};

/// Result of a non-consuming rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Under the cap; `remaining` requests left in the current window.
    Allowed { remaining: u32 },
    /// At the cap until the window (anchored at its first request) elapses.
    Denied { retry_after_secs: u64 },
}

impl RateLimitDecision {
    /// Returns true if the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Current window state for operator surfaces.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests per window.
    pub limit: u32,
    /// Requests counted in the current window.
    pub count: u32,
    /// When the current window opened; `None` if no window is live.
    pub window_opened_at: Option<Timestamp>,
}

/// Errors from the rate limiter.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

/// Port for per-license request-rate limiting.
///
/// Implementations must anchor each window at the first request that opened
/// it; later requests are compared against that anchor and never move it.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Checks the cap without consuming.
    async fn check(&self, license_id: &LicenseId) -> Result<RateLimitDecision, RateLimitError>;

    /// Counts one request against the current window, opening one if needed.
    async fn increment(&self, license_id: &LicenseId) -> Result<(), RateLimitError>;

    /// Current window state without consuming.
    async fn status(&self, license_id: &LicenseId) -> Result<RateLimitStatus, RateLimitError>;

    /// Clears the window (admin operation).
    async fn reset(&self, license_id: &LicenseId) -> Result<(), RateLimitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_decision_reports_remaining() {
        let decision = RateLimitDecision::Allowed { remaining: 12 };
        assert!(decision.is_allowed());
    }

    #[test]
    fn denied_decision_is_not_allowed() {
        let decision = RateLimitDecision::Denied { retry_after_secs: 41 };
        assert!(!decision.is_allowed());
    }
}
