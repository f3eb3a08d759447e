//! License aggregate entity.
//!
//! A license is a tenant's entitlement to bounded access to the metered
//! upstream resource. It carries the long-window volume quota (`gb_used` /
//! `gb_limit`) measured over a monthly billing cycle.
//!
//! # Design Decisions
//!
//! - **Soft lifecycle**: licenses are never hard-deleted; `suspend`/`expire`
//!   are status transitions only
//! - **Quota in decimal gigabytes**: `gb_used += bytes / 1e9`
//! - **State transitions validated**: status changes go through the
//!   [`StateMachine`] table

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, LicenseId, StateMachine, Timestamp};

use super::{BillingCycle, LicenseKey, LicenseStatus, MAX_CYCLE_START_DAY};

/// Bytes in one decimal gigabyte.
const BYTES_PER_GB: f64 = 1e9;

/// License aggregate.
///
/// # Invariants
///
/// - `gb_used` is monotonically non-decreasing within one billing cycle and
///   drops to zero only via [`License::reset_usage`] or cycle rollover
/// - `cycle_start_day` stays within `[1, 28]`
/// - status transitions follow the [`LicenseStatus`] state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    /// Unique identifier.
    pub id: LicenseId,

    /// Secret credential the caller presents.
    pub key: LicenseKey,

    /// Contact identity of the owner.
    pub contact_email: String,

    /// Current lifecycle status.
    pub status: LicenseStatus,

    /// Gigabytes consumed in the current cycle.
    pub gb_used: f64,

    /// Gigabyte quota per cycle.
    pub gb_limit: f64,

    /// Anchor day-of-month the quota cycle starts on (1-28).
    pub cycle_start_day: u8,

    /// Start of the cycle `gb_used` currently measures.
    pub cycle_started_at: Timestamp,

    /// External payment subscription reference, when sold through a
    /// payment provider.
    pub subscription_ref: Option<String>,

    /// When the license was created.
    pub created_at: Timestamp,

    /// When access lapses unless renewed.
    pub expires_at: Timestamp,

    /// Most recent metered request, if any.
    pub last_request_at: Option<Timestamp>,
}

impl License {
    /// Creates a trial license.
    ///
    /// Trials are immediately usable, metered against `gb_limit`, and
    /// expire after `trial_days`.
    pub fn new_trial(
        id: LicenseId,
        key: LicenseKey,
        contact_email: String,
        gb_limit: f64,
        cycle_start_day: u8,
        trial_days: i64,
    ) -> Self {
        let now = Timestamp::now();
        let day = cycle_start_day.clamp(1, MAX_CYCLE_START_DAY);
        Self {
            id,
            key,
            contact_email,
            status: LicenseStatus::Trial,
            gb_used: 0.0,
            gb_limit,
            cycle_start_day: day,
            cycle_started_at: BillingCycle::containing(day, now).start,
            subscription_ref: None,
            created_at: now,
            expires_at: now.add_days(trial_days),
            last_request_at: None,
        }
    }

    /// Whether the license currently admits metered requests.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.status.grants_access() && now < self.expires_at
    }

    /// Whether quota remains in the current cycle.
    pub fn has_gb_available(&self) -> bool {
        self.gb_used < self.gb_limit
    }

    /// Gigabytes left before the quota trips; never negative.
    pub fn gb_remaining(&self) -> f64 {
        (self.gb_limit - self.gb_used).max(0.0)
    }

    /// Records metered consumption.
    pub fn record_bytes(&mut self, bytes: u64) {
        self.gb_used += bytes as f64 / BYTES_PER_GB;
        self.last_request_at = Some(Timestamp::now());
    }

    /// Resets consumption if the billing cycle has rolled over since the
    /// last update. Returns true when a rollover happened.
    pub fn roll_cycle_if_needed(&mut self, now: Timestamp) -> bool {
        let current = BillingCycle::containing(self.cycle_start_day, now);
        if current.start != self.cycle_started_at {
            self.gb_used = 0.0;
            self.cycle_started_at = current.start;
            true
        } else {
            false
        }
    }

    /// Activates (or renews) the license for `days` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow activation.
    pub fn activate(&mut self, days: i64) -> Result<(), DomainError> {
        self.transition_to(LicenseStatus::Active)?;
        self.expires_at = Timestamp::now().add_days(days);
        Ok(())
    }

    /// Suspends the license.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow suspension.
    pub fn suspend(&mut self) -> Result<(), DomainError> {
        self.transition_to(LicenseStatus::Suspended)
    }

    /// Marks the license expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow expiry.
    pub fn expire(&mut self) -> Result<(), DomainError> {
        self.transition_to(LicenseStatus::Expired)
    }

    /// Zeroes the cycle's consumption (admin operation).
    pub fn reset_usage(&mut self) {
        self.gb_used = 0.0;
    }

    /// Changes the cycle anchor day, clamped to the valid range.
    pub fn set_cycle_start_day(&mut self, day: u8) {
        self.cycle_start_day = day.clamp(1, MAX_CYCLE_START_DAY);
    }

    /// Attaches the external payment subscription reference.
    pub fn link_subscription(&mut self, reference: impl Into<String>) {
        self.subscription_ref = Some(reference.into());
    }

    fn transition_to(&mut self, target: LicenseStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition license from {} to {}", self.status, target),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_license() -> License {
        License::new_trial(
            LicenseId::new(),
            LicenseKey::generate(),
            "owner@example.com".to_string(),
            4.0,
            1,
            30,
        )
    }

    // Construction

    #[test]
    fn new_trial_starts_metered_and_empty() {
        let license = test_license();
        assert_eq!(license.status, LicenseStatus::Trial);
        assert_eq!(license.gb_used, 0.0);
        assert!(license.is_valid(Timestamp::now()));
        assert!(license.last_request_at.is_none());
    }

    #[test]
    fn new_trial_clamps_cycle_day() {
        let license = License::new_trial(
            LicenseId::new(),
            LicenseKey::generate(),
            "owner@example.com".to_string(),
            4.0,
            31,
            30,
        );
        assert_eq!(license.cycle_start_day, 28);
    }

    // Quota accounting

    #[test]
    fn record_bytes_accumulates_decimal_gb() {
        let mut license = test_license();
        license.record_bytes(200_000_000);
        license.record_bytes(300_000_000);
        assert!((license.gb_used - 0.5).abs() < 1e-9);
        assert!(license.last_request_at.is_some());
    }

    #[test]
    fn usage_sum_matches_recorded_bytes() {
        let mut license = test_license();
        let chunks = [1_000u64, 999_999, 123_456_789, 2_000_000];
        for b in chunks {
            license.record_bytes(b);
        }
        let expected: f64 = chunks.iter().map(|b| *b as f64 / 1e9).sum();
        assert!((license.gb_used - expected).abs() < 1e-12);
    }

    #[test]
    fn reset_usage_zeroes_regardless_of_history() {
        let mut license = test_license();
        license.record_bytes(3_900_000_000);
        license.reset_usage();
        assert_eq!(license.gb_used, 0.0);
    }

    #[test]
    fn has_gb_available_trips_at_limit() {
        let mut license = test_license();
        assert!(license.has_gb_available());
        license.record_bytes(4_100_000_000);
        assert!(!license.has_gb_available());
        assert_eq!(license.gb_remaining(), 0.0);
    }

    // Cycle rollover

    #[test]
    fn rollover_resets_usage_in_a_new_cycle() {
        let mut license = test_license();
        license.record_bytes(1_000_000_000);
        let next_cycle = BillingCycle::containing(license.cycle_start_day, Timestamp::now())
            .next_rollover()
            .add_days(1);
        assert!(license.roll_cycle_if_needed(next_cycle));
        assert_eq!(license.gb_used, 0.0);
    }

    #[test]
    fn rollover_is_a_noop_within_the_same_cycle() {
        let mut license = test_license();
        license.record_bytes(1_000_000_000);
        assert!(!license.roll_cycle_if_needed(Timestamp::now()));
        assert!(license.gb_used > 0.0);
    }

    // Lifecycle

    #[test]
    fn activate_extends_expiry_and_changes_status() {
        let mut license = test_license();
        license.activate(365).unwrap();
        assert_eq!(license.status, LicenseStatus::Active);
        assert!(license.expires_at > Timestamp::now().add_days(300));
    }

    #[test]
    fn suspended_license_is_not_valid() {
        let mut license = test_license();
        license.suspend().unwrap();
        assert!(!license.is_valid(Timestamp::now()));
    }

    #[test]
    fn expired_status_rejects_suspension() {
        let mut license = test_license();
        license.expire().unwrap();
        assert!(license.suspend().is_err());
        assert_eq!(license.status, LicenseStatus::Expired);
    }

    #[test]
    fn past_expiry_date_invalidates_even_active_licenses() {
        let mut license = test_license();
        license.activate(30).unwrap();
        let after_expiry = Timestamp::now().add_days(31);
        assert!(!license.is_valid(after_expiry));
    }

    #[test]
    fn link_subscription_stores_reference() {
        let mut license = test_license();
        license.link_subscription("sub_91xJq");
        assert_eq!(license.subscription_ref.as_deref(), Some("sub_91xJq"));
    }
}
