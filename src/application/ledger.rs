//! Usage ledger: license lifecycle and quota accounting.
//!
//! All reads and writes go through the key/value port. Licenses are stored
//! one per key under a common prefix; queries scan that prefix. Usage
//! events land in a capped append-only log.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::foundation::{DomainError, LicenseId, Timestamp, ValidationError};
use crate::domain::license::{License, LicenseKey, LicenseStatus};
use crate::domain::usage::UsageEvent;
use crate::ports::{KeyValueStore, KeyValueStoreExt, StoreError};

const LICENSE_PREFIX: &str = "license:";
const EVENT_LOG_KEY: &str = "usage:events";
const EVENT_LOG_CAP: usize = 1000;

/// Defaults applied to newly created licenses.
#[derive(Debug, Clone)]
pub struct LedgerDefaults {
    /// Gigabyte quota per cycle for new licenses.
    pub gb_limit: f64,
    /// Days until a trial expires.
    pub trial_days: i64,
    /// Cycle anchor day for new licenses.
    pub cycle_start_day: u8,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            gb_limit: 4.0,
            trial_days: 30,
            cycle_start_day: 1,
        }
    }
}

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("license not found: {0}")]
    NotFound(LicenseId),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Filter for license listings.
#[derive(Debug, Clone, Default)]
pub struct LicenseFilter {
    /// Restrict to one status.
    pub status: Option<LicenseStatus>,
    /// Substring match against the contact identity.
    pub contact_contains: Option<String>,
}

/// Counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LicenseCounts {
    pub trial: u32,
    pub active: u32,
    pub suspended: u32,
    pub expired: u32,
}

impl LicenseCounts {
    /// Total licenses counted.
    pub fn total(&self) -> u32 {
        self.trial + self.active + self.suspended + self.expired
    }
}

/// Aggregate ledger statistics for operator surfaces.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LedgerStats {
    /// All licenses ever created.
    pub total_licenses: u32,
    /// Licenses currently valid for metered access.
    pub valid_licenses: u32,
    /// Gigabytes consumed across all licenses this cycle.
    pub total_gb_used: f64,
}

/// Per-tenant quota record service.
pub struct UsageLedger {
    store: Arc<dyn KeyValueStore>,
    defaults: LedgerDefaults,
}

impl UsageLedger {
    /// Creates a ledger over `store` with default limits.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            defaults: LedgerDefaults::default(),
        }
    }

    /// Creates a ledger with explicit defaults.
    pub fn with_defaults(store: Arc<dyn KeyValueStore>, defaults: LedgerDefaults) -> Self {
        Self { store, defaults }
    }

    fn storage_key(id: &LicenseId) -> String {
        format!("{LICENSE_PREFIX}{id}")
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    /// Creates a trial license for a contact identity.
    pub async fn create(&self, contact_email: &str) -> Result<License, LedgerError> {
        if contact_email.trim().is_empty() {
            return Err(ValidationError::empty_field("contact_email").into());
        }

        let license = License::new_trial(
            LicenseId::new(),
            LicenseKey::generate(),
            contact_email.trim().to_string(),
            self.defaults.gb_limit,
            self.defaults.cycle_start_day,
            self.defaults.trial_days,
        );
        self.persist(&license).await?;
        info!(license_id = %license.id, "trial license created");
        Ok(license)
    }

    /// Loads a license by id.
    pub async fn get(&self, id: &LicenseId) -> Result<License, LedgerError> {
        self.store
            .get_typed(&Self::storage_key(id))
            .await?
            .ok_or(LedgerError::NotFound(*id))
    }

    /// Records metered consumption, rolling the billing cycle first when
    /// the anchor month has advanced.
    pub async fn record_usage(
        &self,
        id: &LicenseId,
        bytes: u64,
    ) -> Result<License, LedgerError> {
        let mut license = self.get(id).await?;
        if license.roll_cycle_if_needed(Timestamp::now()) {
            debug!(license_id = %id, "billing cycle rolled over, usage reset");
        }
        license.record_bytes(bytes);
        self.persist(&license).await?;
        Ok(license)
    }

    /// Activates (or renews) a license for `days`.
    pub async fn activate(&self, id: &LicenseId, days: i64) -> Result<License, LedgerError> {
        self.mutate(id, |license| license.activate(days)).await
    }

    /// Suspends a license.
    pub async fn suspend(&self, id: &LicenseId) -> Result<License, LedgerError> {
        self.mutate(id, |license| license.suspend()).await
    }

    /// Expires a license.
    pub async fn expire(&self, id: &LicenseId) -> Result<License, LedgerError> {
        self.mutate(id, |license| license.expire()).await
    }

    /// Zeroes a license's cycle consumption.
    pub async fn reset_usage(&self, id: &LicenseId) -> Result<License, LedgerError> {
        self.mutate(id, |license| {
            license.reset_usage();
            Ok(())
        })
        .await
    }

    /// Changes a license's cycle anchor day.
    pub async fn set_cycle_start_day(
        &self,
        id: &LicenseId,
        day: u8,
    ) -> Result<License, LedgerError> {
        self.mutate(id, |license| {
            license.set_cycle_start_day(day);
            Ok(())
        })
        .await
    }

    /// Changes a license's gigabyte quota.
    pub async fn set_gb_limit(&self, id: &LicenseId, gb_limit: f64) -> Result<License, LedgerError> {
        if gb_limit <= 0.0 {
            return Err(ValidationError::invalid_format("gb_limit", "must be positive").into());
        }
        self.mutate(id, |license| {
            license.gb_limit = gb_limit;
            Ok(())
        })
        .await
    }

    /// Attaches an external payment subscription reference.
    pub async fn link_subscription(
        &self,
        id: &LicenseId,
        reference: &str,
    ) -> Result<License, LedgerError> {
        let reference = reference.to_string();
        self.mutate(id, move |license| {
            license.link_subscription(reference.clone());
            Ok(())
        })
        .await
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Finds the license matching a presented credential.
    ///
    /// Every candidate is compared in constant time.
    pub async fn find_by_key(&self, presented: &str) -> Result<Option<License>, LedgerError> {
        let licenses = self.load_all().await?;
        Ok(licenses.into_iter().find(|l| l.key.matches(presented)))
    }

    /// Finds a license by its contact identity.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<License>, LedgerError> {
        let licenses = self.load_all().await?;
        Ok(licenses
            .into_iter()
            .find(|l| l.contact_email.eq_ignore_ascii_case(email)))
    }

    /// Finds a license by its external subscription reference.
    pub async fn find_by_subscription(
        &self,
        reference: &str,
    ) -> Result<Option<License>, LedgerError> {
        let licenses = self.load_all().await?;
        Ok(licenses
            .into_iter()
            .find(|l| l.subscription_ref.as_deref() == Some(reference)))
    }

    /// Lists licenses matching a filter, newest first.
    pub async fn list(&self, filter: &LicenseFilter) -> Result<Vec<License>, LedgerError> {
        let mut licenses: Vec<License> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|l| filter.status.map_or(true, |s| l.status == s))
            .filter(|l| {
                filter
                    .contact_contains
                    .as_deref()
                    .map_or(true, |needle| l.contact_email.contains(needle))
            })
            .collect();
        licenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(licenses)
    }

    /// Counts licenses per status.
    pub async fn counts_by_status(&self) -> Result<LicenseCounts, LedgerError> {
        let mut counts = LicenseCounts::default();
        for license in self.load_all().await? {
            match license.status {
                LicenseStatus::Trial => counts.trial += 1,
                LicenseStatus::Active => counts.active += 1,
                LicenseStatus::Suspended => counts.suspended += 1,
                LicenseStatus::Expired => counts.expired += 1,
            }
        }
        Ok(counts)
    }

    /// Aggregate statistics across all licenses.
    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let licenses = self.load_all().await?;
        let now = Timestamp::now();
        Ok(LedgerStats {
            total_licenses: licenses.len() as u32,
            valid_licenses: licenses.iter().filter(|l| l.is_valid(now)).count() as u32,
            total_gb_used: licenses.iter().map(|l| l.gb_used).sum(),
        })
    }

    // ─── Sweeps ──────────────────────────────────────────────────────

    /// Expires every trial/active license past its expiry date.
    ///
    /// Idempotent: already-expired licenses are skipped, so the sweep is
    /// safe to run on any cadence. Returns how many licenses transitioned.
    pub async fn check_expired_licenses(&self, as_of: Timestamp) -> Result<u32, LedgerError> {
        let mut expired = 0;
        for mut license in self.load_all().await? {
            if license.status.grants_access() && license.expires_at < as_of {
                license.expire()?;
                self.persist(&license).await?;
                expired += 1;
                info!(license_id = %license.id, "license expired by sweep");
            }
        }
        Ok(expired)
    }

    // ─── Usage event log ─────────────────────────────────────────────

    /// Appends a usage event, trimming the log to its cap.
    pub async fn append_event(&self, event: UsageEvent) -> Result<(), LedgerError> {
        let mut events: Vec<UsageEvent> = self
            .store
            .get_typed(EVENT_LOG_KEY)
            .await?
            .unwrap_or_default();
        events.push(event);
        if events.len() > EVENT_LOG_CAP {
            let excess = events.len() - EVENT_LOG_CAP;
            events.drain(..excess);
        }
        self.store.set_typed(EVENT_LOG_KEY, &events).await?;
        Ok(())
    }

    /// The most recent usage events, newest last.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<UsageEvent>, LedgerError> {
        let events: Vec<UsageEvent> = self
            .store
            .get_typed(EVENT_LOG_KEY)
            .await?
            .unwrap_or_default();
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }

    // ─── Internals ───────────────────────────────────────────────────

    async fn persist(&self, license: &License) -> Result<(), LedgerError> {
        self.store
            .set_typed(&Self::storage_key(&license.id), license)
            .await?;
        Ok(())
    }

    async fn mutate<F>(&self, id: &LicenseId, op: F) -> Result<License, LedgerError>
    where
        F: FnOnce(&mut License) -> Result<(), DomainError>,
    {
        let mut license = self.get(id).await?;
        op(&mut license)?;
        self.persist(&license).await?;
        Ok(license)
    }

    async fn load_all(&self) -> Result<Vec<License>, LedgerError> {
        let keys = self.store.keys_with_prefix(LICENSE_PREFIX).await?;
        let mut licenses = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(license) = self.store.get_typed::<License>(&key).await? {
                licenses.push(license);
            }
        }
        Ok(licenses)
    }
}

/// Builds a metadata map from key/value pairs. Test and caller convenience.
pub fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStore;

    fn ledger() -> UsageLedger {
        UsageLedger::new(Arc::new(InMemoryStore::new()))
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    #[tokio::test]
    async fn create_persists_a_trial_license() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        let loaded = ledger.get(&license.id).await.unwrap();
        assert_eq!(loaded.status, LicenseStatus::Trial);
        assert_eq!(loaded.gb_used, 0.0);
        assert_eq!(loaded.contact_email, "owner@example.com");
    }

    #[tokio::test]
    async fn create_rejects_empty_contact() {
        let ledger = ledger();
        assert!(ledger.create("   ").await.is_err());
    }

    #[tokio::test]
    async fn record_usage_accumulates() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        ledger.record_usage(&license.id, 200_000_000).await.unwrap();
        let updated = ledger.record_usage(&license.id, 300_000_000).await.unwrap();
        assert!((updated.gb_used - 0.5).abs() < 1e-9);
        assert!(updated.last_request_at.is_some());
    }

    #[tokio::test]
    async fn reset_usage_zeroes_history() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();
        ledger.record_usage(&license.id, 3_000_000_000).await.unwrap();

        let reset = ledger.reset_usage(&license.id).await.unwrap();
        assert_eq!(reset.gb_used, 0.0);
    }

    #[tokio::test]
    async fn activate_then_suspend_then_recover() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        let active = ledger.activate(&license.id, 365).await.unwrap();
        assert_eq!(active.status, LicenseStatus::Active);

        let suspended = ledger.suspend(&license.id).await.unwrap();
        assert_eq!(suspended.status, LicenseStatus::Suspended);

        let recovered = ledger.activate(&license.id, 365).await.unwrap();
        assert_eq!(recovered.status, LicenseStatus::Active);
    }

    #[tokio::test]
    async fn cycle_start_day_can_be_adjusted_and_is_clamped() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        let updated = ledger.set_cycle_start_day(&license.id, 15).await.unwrap();
        assert_eq!(updated.cycle_start_day, 15);

        let clamped = ledger.set_cycle_start_day(&license.id, 31).await.unwrap();
        assert_eq!(clamped.cycle_start_day, 28);
    }

    #[tokio::test]
    async fn gb_limit_can_be_raised_but_not_zeroed() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        let raised = ledger.set_gb_limit(&license.id, 10.0).await.unwrap();
        assert_eq!(raised.gb_limit, 10.0);

        assert!(ledger.set_gb_limit(&license.id, 0.0).await.is_err());
    }

    #[tokio::test]
    async fn unknown_license_is_not_found() {
        let ledger = ledger();
        let missing = LicenseId::new();
        assert!(matches!(
            ledger.get(&missing).await,
            Err(LedgerError::NotFound(id)) if id == missing
        ));
    }

    // ─── Queries ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn find_by_key_matches_the_right_license() {
        let ledger = ledger();
        let a = ledger.create("a@example.com").await.unwrap();
        let _b = ledger.create("b@example.com").await.unwrap();

        let found = ledger.find_by_key(a.key.expose()).await.unwrap().unwrap();
        assert_eq!(found.id, a.id);

        assert!(ledger.find_by_key("sg_bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_email_is_case_insensitive() {
        let ledger = ledger();
        ledger.create("Owner@Example.com").await.unwrap();
        let found = ledger.find_by_email("owner@example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn find_by_subscription_reference() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();
        ledger.link_subscription(&license.id, "sub_42").await.unwrap();

        let found = ledger.find_by_subscription("sub_42").await.unwrap().unwrap();
        assert_eq!(found.id, license.id);
        assert!(ledger.find_by_subscription("sub_0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_status_and_contact() {
        let ledger = ledger();
        let a = ledger.create("alpha@example.com").await.unwrap();
        ledger.create("beta@example.com").await.unwrap();
        ledger.activate(&a.id, 30).await.unwrap();

        let active_only = ledger
            .list(&LicenseFilter {
                status: Some(LicenseStatus::Active),
                ..LicenseFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].id, a.id);

        let by_contact = ledger
            .list(&LicenseFilter {
                contact_contains: Some("beta".to_string()),
                ..LicenseFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_contact.len(), 1);
    }

    #[tokio::test]
    async fn counts_and_stats_reflect_the_population() {
        let ledger = ledger();
        let a = ledger.create("a@example.com").await.unwrap();
        let b = ledger.create("b@example.com").await.unwrap();
        ledger.activate(&a.id, 30).await.unwrap();
        ledger.suspend(&b.id).await.unwrap();
        ledger.record_usage(&a.id, 1_000_000_000).await.unwrap();

        let counts = ledger.counts_by_status().await.unwrap();
        assert_eq!(counts.active, 1);
        assert_eq!(counts.suspended, 1);
        assert_eq!(counts.total(), 2);

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_licenses, 2);
        assert_eq!(stats.valid_licenses, 1);
        assert!((stats.total_gb_used - 1.0).abs() < 1e-9);
    }

    // ─── Sweeps ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn expiry_sweep_is_idempotent() {
        let ledger = ledger();
        let license = ledger.create("owner@example.com").await.unwrap();

        let future = Timestamp::now().add_days(31);
        assert_eq!(ledger.check_expired_licenses(future).await.unwrap(), 1);
        assert_eq!(ledger.check_expired_licenses(future).await.unwrap(), 0);

        let expired = ledger.get(&license.id).await.unwrap();
        assert_eq!(expired.status, LicenseStatus::Expired);
    }

    #[tokio::test]
    async fn sweep_spares_unexpired_licenses() {
        let ledger = ledger();
        ledger.create("owner@example.com").await.unwrap();
        assert_eq!(
            ledger.check_expired_licenses(Timestamp::now()).await.unwrap(),
            0
        );
    }

    // ─── Event log ───────────────────────────────────────────────────

    #[tokio::test]
    async fn event_log_appends_and_caps() {
        let ledger = ledger();
        let id = LicenseId::new();

        for i in 0..5 {
            ledger
                .append_event(UsageEvent::new(
                    id,
                    "search",
                    i,
                    "test",
                    HashMap::new(),
                ))
                .await
                .unwrap();
        }

        let recent = ledger.recent_events(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].bytes, 4);
    }
}
