//! In-memory fixed-window rate limiter.
//!
//! Each license gets a counting window anchored at the first request that
//! opened it. Subsequent requests are compared against that anchor and
//! never move it, so a continuously active license is released exactly one
//! window after it first hit the cap.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{LicenseId, Timestamp};
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitStatus, RateLimiter};

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Default requests per window.
pub const DEFAULT_LIMIT: u32 = 30;

/// State for one license's window.
#[derive(Debug, Clone, Copy)]
struct Window {
    /// Unix seconds of the first request in this window. Never advanced
    /// by later requests.
    opened_at: u64,
    count: u32,
}

/// Fixed-window in-memory limiter.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    limit: u32,
    window_secs: u64,
    windows: Arc<RwLock<HashMap<LicenseId, Window>>>,
}

impl FixedWindowRateLimiter {
    /// Creates a limiter with an explicit cap and window length.
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            limit,
            window_secs,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a limiter with the default 30-per-60s contract.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW_SECS)
    }

    fn now_secs() -> u64 {
        Timestamp::now().as_unix_secs()
    }

    fn window_expired(&self, window: &Window, now: u64) -> bool {
        now >= window.opened_at + self.window_secs
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, license_id: &LicenseId) -> Result<RateLimitDecision, RateLimitError> {
        let now = Self::now_secs();
        let windows = self.windows.read().await;

        let decision = match windows.get(license_id) {
            Some(window) if !self.window_expired(window, now) => {
                if window.count >= self.limit {
                    let retry_after =
                        (window.opened_at + self.window_secs).saturating_sub(now).max(1);
                    RateLimitDecision::Denied {
                        retry_after_secs: retry_after,
                    }
                } else {
                    RateLimitDecision::Allowed {
                        remaining: self.limit - window.count,
                    }
                }
            }
            // No window, or the anchored window has elapsed
            _ => RateLimitDecision::Allowed {
                remaining: self.limit,
            },
        };
        Ok(decision)
    }

    async fn increment(&self, license_id: &LicenseId) -> Result<(), RateLimitError> {
        let now = Self::now_secs();
        let mut windows = self.windows.write().await;

        match windows.get_mut(license_id) {
            Some(window) if !self.window_expired(window, now) => {
                // Count against the existing window; the anchor stays put.
                window.count += 1;
            }
            _ => {
                windows.insert(
                    *license_id,
                    Window {
                        opened_at: now,
                        count: 1,
                    },
                );
            }
        }
        Ok(())
    }

    async fn status(&self, license_id: &LicenseId) -> Result<RateLimitStatus, RateLimitError> {
        let now = Self::now_secs();
        let windows = self.windows.read().await;

        let status = match windows.get(license_id) {
            Some(window) if !self.window_expired(window, now) => RateLimitStatus {
                limit: self.limit,
                count: window.count,
                window_opened_at: Some(Timestamp::from_unix_secs(window.opened_at)),
            },
            _ => RateLimitStatus {
                limit: self.limit,
                count: 0,
                window_opened_at: None,
            },
        };
        Ok(status)
    }

    async fn reset(&self, license_id: &LicenseId) -> Result<(), RateLimitError> {
        self.windows.write().await.remove(license_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn allows_up_to_the_cap() {
        let limiter = FixedWindowRateLimiter::new(5, 60);
        let id = LicenseId::new();

        for _ in 0..5 {
            assert!(limiter.check(&id).await.unwrap().is_allowed());
            limiter.increment(&id).await.unwrap();
        }
        assert!(!limiter.check(&id).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn check_does_not_consume() {
        let limiter = FixedWindowRateLimiter::new(2, 60);
        let id = LicenseId::new();

        for _ in 0..10 {
            assert!(limiter.check(&id).await.unwrap().is_allowed());
        }
        let status = limiter.status(&id).await.unwrap();
        assert_eq!(status.count, 0);
    }

    #[tokio::test]
    async fn remaining_counts_down() {
        let limiter = FixedWindowRateLimiter::new(3, 60);
        let id = LicenseId::new();

        limiter.increment(&id).await.unwrap();
        match limiter.check(&id).await.unwrap() {
            RateLimitDecision::Allowed { remaining } => assert_eq!(remaining, 2),
            other => panic!("expected allowed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn window_is_anchored_not_renewed_by_traffic() {
        // 1-second window; keep incrementing past the cap. If increments
        // renewed the window, the license would never be released.
        let limiter = FixedWindowRateLimiter::new(2, 1);
        let id = LicenseId::new();

        limiter.increment(&id).await.unwrap();
        limiter.increment(&id).await.unwrap();
        assert!(!limiter.check(&id).await.unwrap().is_allowed());

        // Sustained traffic while capped
        limiter.increment(&id).await.unwrap();
        limiter.increment(&id).await.unwrap();

        sleep(Duration::from_millis(1100)).await;
        assert!(
            limiter.check(&id).await.unwrap().is_allowed(),
            "anchored window must release once it elapses"
        );
    }

    #[tokio::test]
    async fn expired_window_restarts_on_next_increment() {
        let limiter = FixedWindowRateLimiter::new(2, 1);
        let id = LicenseId::new();

        limiter.increment(&id).await.unwrap();
        sleep(Duration::from_millis(1100)).await;
        limiter.increment(&id).await.unwrap();

        let status = limiter.status(&id).await.unwrap();
        assert_eq!(status.count, 1);
    }

    #[tokio::test]
    async fn licenses_are_independent() {
        let limiter = FixedWindowRateLimiter::new(1, 60);
        let a = LicenseId::new();
        let b = LicenseId::new();

        limiter.increment(&a).await.unwrap();
        assert!(!limiter.check(&a).await.unwrap().is_allowed());
        assert!(limiter.check(&b).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn reset_clears_the_window() {
        let limiter = FixedWindowRateLimiter::new(1, 60);
        let id = LicenseId::new();

        limiter.increment(&id).await.unwrap();
        assert!(!limiter.check(&id).await.unwrap().is_allowed());

        limiter.reset(&id).await.unwrap();
        assert!(limiter.check(&id).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn denied_reports_retry_within_window() {
        let limiter = FixedWindowRateLimiter::new(1, 60);
        let id = LicenseId::new();
        limiter.increment(&id).await.unwrap();

        match limiter.check(&id).await.unwrap() {
            RateLimitDecision::Denied { retry_after_secs } => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            other => panic!("expected denied, got {other:?}"),
        }
    }
}
