//! In-memory tick scheduler for tests.
//!
//! Records registrations without running anything; tests drive the engine
//! by calling its tick entry point directly and assert on what was
//! scheduled.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{ScheduleError, TickScheduler};

/// A recorded registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEntry {
    /// When the hook is next due.
    pub due: Timestamp,
    /// Recurrence interval; `None` for one-shots.
    pub interval_secs: Option<u64>,
}

/// Deterministic scheduler double.
#[derive(Debug, Default, Clone)]
pub struct InMemoryScheduler {
    entries: Arc<RwLock<HashMap<String, ScheduledEntry>>>,
}

impl InMemoryScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded entry for `hook`, if any.
    pub async fn entry(&self, hook: &str) -> Option<ScheduledEntry> {
        self.entries.read().await.get(hook).copied()
    }

    /// True if anything is registered under `hook`.
    pub async fn is_scheduled(&self, hook: &str) -> bool {
        self.entries.read().await.contains_key(hook)
    }
}

#[async_trait]
impl TickScheduler for InMemoryScheduler {
    async fn schedule_one_shot(&self, hook: &str, delay_secs: u64) -> Result<(), ScheduleError> {
        self.entries.write().await.insert(
            hook.to_string(),
            ScheduledEntry {
                due: Timestamp::now().plus_secs(delay_secs),
                interval_secs: None,
            },
        );
        Ok(())
    }

    async fn schedule_recurring(
        &self,
        hook: &str,
        interval_secs: u64,
    ) -> Result<(), ScheduleError> {
        self.entries.write().await.insert(
            hook.to_string(),
            ScheduledEntry {
                due: Timestamp::now().plus_secs(interval_secs),
                interval_secs: Some(interval_secs),
            },
        );
        Ok(())
    }

    async fn next_scheduled(&self, hook: &str) -> Option<Timestamp> {
        self.entries.read().await.get(hook).map(|e| e.due)
    }

    async fn clear(&self, hook: &str) -> Result<(), ScheduleError> {
        self.entries.write().await.remove(hook);
        Ok(())
    }
}
