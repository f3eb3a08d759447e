//! Tick scheduler port.
//!
//! The external periodic-trigger collaborator: it can register one-shot
//! delayed callbacks (the next sync tick) and fixed-interval recurring
//! callbacks (the run trigger). The sync engine never sleeps itself;
//! waiting between items is delegated here.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;

/// Errors from the scheduler backend.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The scheduler backend rejected or lost the registration.
    #[error("scheduler error: {0}")]
    Backend(String),
}

/// Port for registering named, timed callbacks.
#[async_trait]
pub trait TickScheduler: Send + Sync {
    /// Fires `hook` once after `delay_secs`.
    ///
    /// Re-registering a pending one-shot replaces it.
    async fn schedule_one_shot(&self, hook: &str, delay_secs: u64) -> Result<(), ScheduleError>;

    /// Fires `hook` every `interval_secs` until cleared.
    async fn schedule_recurring(&self, hook: &str, interval_secs: u64)
        -> Result<(), ScheduleError>;

    /// Next time `hook` is due, if scheduled.
    async fn next_scheduled(&self, hook: &str) -> Option<Timestamp>;

    /// Cancels anything registered under `hook`.
    async fn clear(&self, hook: &str) -> Result<(), ScheduleError>;
}
