//! Sync run accounting.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Aggregate statistics for one sync run.
///
/// Exactly one run may have `running = true` at a time; the persisted flag
/// is the single-flight guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRunStats {
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished; `None` while running.
    pub finished_at: Option<Timestamp>,
    /// Items snapshotted into the queue.
    pub total: u32,
    /// Items that reached a terminal state.
    pub processed: u32,
    /// Items refreshed successfully.
    pub success: u32,
    /// Items that exhausted their retries.
    pub failed: u32,
    /// Single-flight flag.
    pub running: bool,
}

impl SyncRunStats {
    /// Stats for a freshly started run over `total` items.
    pub fn started(total: u32) -> Self {
        Self {
            started_at: Timestamp::now(),
            finished_at: None,
            total,
            processed: 0,
            success: 0,
            failed: 0,
            running: true,
        }
    }

    /// Marks the run finished now.
    pub fn finish(&mut self) {
        self.running = false;
        self.finished_at = Some(Timestamp::now());
    }

    /// Completion percentage in `[0, 100]`.
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Summary entry appended to the capped run log when a run finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRunSummary {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub total: u32,
    pub success: u32,
    pub failed: u32,
}

impl SyncRunSummary {
    /// Builds the log entry for a finished run.
    ///
    /// Returns `None` while the run is still live.
    pub fn from_stats(stats: &SyncRunStats) -> Option<Self> {
        Some(Self {
            started_at: stats.started_at,
            finished_at: stats.finished_at?,
            total: stats.total,
            success: stats.success,
            failed: stats.failed,
        })
    }
}
