//! Application services composing the domain over the ports.

mod anomaly;
mod gateway;
mod ledger;
mod sync_engine;

pub use anomaly::{AnomalyMonitor, DEFAULT_HOURLY_THRESHOLD_BYTES};
pub use gateway::{
    AdmissionDecision, DenialReason, GatewayError, QuotaGateway, RequestContext,
    DEFAULT_MAX_REQUEST_BYTES,
};
pub use ledger::{
    metadata, LedgerDefaults, LedgerError, LicenseCounts, LicenseFilter, LedgerStats, UsageLedger,
};
pub use sync_engine::{
    SyncEngine, SyncEngineConfig, SyncError, SyncInfo, RUN_HOOK, TICK_HOOK,
};
