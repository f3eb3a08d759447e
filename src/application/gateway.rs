//! Quota gateway: admission control for the metered upstream resource.
//!
//! `check_request` evaluates, in fixed priority order, license validity,
//! long-window volume quota, and the short-window rate limit; the first
//! failing check short-circuits. `record_request` books consumption after a
//! call was actually made.

use std::sync::Arc;
use tracing::debug;

use crate::domain::foundation::{LicenseId, Timestamp};
use crate::domain::license::License;
use crate::domain::usage::UsageEvent;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimiter};

use super::anomaly::AnomalyMonitor;
use super::ledger::{LedgerError, UsageLedger};

/// Default per-request byte ceiling (2 MB).
///
/// Bounds the damage of a single malformed or adversarial size report.
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = 2_000_000;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// License missing, wrong status, or past expiry.
    LicenseInvalid,
    /// Cycle volume quota exhausted.
    GbExceeded,
    /// Short-window request cap reached.
    RateLimit,
}

impl DenialReason {
    /// Stable reason code for callers and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::LicenseInvalid => "license_invalid",
            DenialReason::GbExceeded => "gb_exceeded",
            DenialReason::RateLimit => "rate_limit",
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AdmissionDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Denial reason code; `None` when allowed.
    pub reason: Option<DenialReason>,
    /// Actionable message for the caller.
    pub message: String,
}

impl AdmissionDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            message: "ok".to_string(),
        }
    }

    fn denied(reason: DenialReason, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            message: message.into(),
        }
    }
}

/// Context recorded alongside a metered request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Logical endpoint that was called.
    pub endpoint: String,
    /// Where the request originated (site host, peer name).
    pub origin: String,
    /// Free-form diagnostics.
    pub metadata: std::collections::HashMap<String, String>,
}

impl RequestContext {
    /// Context for an endpoint with a known origin.
    pub fn new(endpoint: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            origin: origin.into(),
            metadata: std::collections::HashMap::new(),
        }
    }
}

/// Errors from gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
}

/// Admission-control entry point.
pub struct QuotaGateway {
    ledger: Arc<UsageLedger>,
    limiter: Arc<dyn RateLimiter>,
    monitor: Arc<AnomalyMonitor>,
    max_request_bytes: u64,
}

impl QuotaGateway {
    /// Creates a gateway with the default per-request ceiling.
    pub fn new(
        ledger: Arc<UsageLedger>,
        limiter: Arc<dyn RateLimiter>,
        monitor: Arc<AnomalyMonitor>,
    ) -> Self {
        Self {
            ledger,
            limiter,
            monitor,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }

    /// Overrides the per-request byte ceiling.
    pub fn with_max_request_bytes(mut self, max: u64) -> Self {
        self.max_request_bytes = max;
        self
    }

    /// Evaluates admission for a license without consuming anything.
    ///
    /// Priority: validity, then quota, then rate limit; the first failing
    /// check short-circuits.
    pub async fn check_request(
        &self,
        license: &License,
    ) -> Result<AdmissionDecision, GatewayError> {
        let now = Timestamp::now();

        if !license.is_valid(now) {
            return Ok(AdmissionDecision::denied(
                DenialReason::LicenseInvalid,
                format!("License is {} and cannot make requests", license.status),
            ));
        }

        // Judge quota against the cycle containing "now"; a rollover that
        // has not been persisted yet must not reject the request.
        let mut current = license.clone();
        current.roll_cycle_if_needed(now);
        if !current.has_gb_available() {
            return Ok(AdmissionDecision::denied(
                DenialReason::GbExceeded,
                format!(
                    "Cycle quota exhausted: {:.2} of {:.2} GB used",
                    current.gb_used, current.gb_limit
                ),
            ));
        }

        match self.limiter.check(&license.id).await? {
            RateLimitDecision::Denied { retry_after_secs } => Ok(AdmissionDecision::denied(
                DenialReason::RateLimit,
                format!("Rate limit reached; retry in {retry_after_secs}s"),
            )),
            RateLimitDecision::Allowed { .. } => Ok(AdmissionDecision::allowed()),
        }
    }

    /// Records one completed request against the license.
    ///
    /// Clamps the reported size, books usage in the ledger, counts the
    /// request in the rate limiter, appends a usage event, and feeds the
    /// anomaly monitor. Returns the updated license.
    pub async fn record_request(
        &self,
        license_id: &LicenseId,
        bytes: u64,
        context: RequestContext,
    ) -> Result<License, GatewayError> {
        let clamped = bytes.min(self.max_request_bytes);
        if clamped < bytes {
            debug!(
                license_id = %license_id,
                reported = bytes,
                clamped,
                "request size clamped to per-request ceiling"
            );
        }

        let license = self.ledger.record_usage(license_id, clamped).await?;
        self.limiter.increment(license_id).await?;
        self.ledger
            .append_event(UsageEvent::new(
                *license_id,
                context.endpoint,
                clamped,
                context.origin,
                context.metadata,
            ))
            .await?;

        // Observability only; never affects the outcome.
        self.monitor.observe(*license_id, clamped);

        Ok(license)
    }
}
