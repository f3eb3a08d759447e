//! Sync domain: queue snapshot, run accounting, cadence.

mod frequency;
mod queue;
mod run;

pub use frequency::SyncFrequency;
pub use queue::{first_pending, SyncItemStatus, SyncQueueItem};
pub use run::{SyncRunStats, SyncRunSummary};
