//! Sync queue items.
//!
//! The queue is ephemeral: built fresh at the start of a run, persisted as a
//! snapshot so ticks survive restarts, and discarded when the run finishes.

use serde::{Deserialize, Serialize};

/// Terminality of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemStatus {
    /// Not yet refreshed; eligible for the next scan.
    Pending,
    /// Refreshed successfully.
    Success,
    /// Retries exhausted.
    Failed,
}

impl SyncItemStatus {
    /// Whether the item has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncItemStatus::Pending)
    }
}

/// One item awaiting refresh within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    /// Upstream identifier to fetch.
    pub source_id: String,
    /// Local record to write the refresh into.
    pub target_id: u64,
    /// Failed attempts so far this run.
    pub retries: u32,
    /// Current state.
    pub status: SyncItemStatus,
}

impl SyncQueueItem {
    /// Creates a pending item with zero retries.
    pub fn pending(source_id: impl Into<String>, target_id: u64) -> Self {
        Self {
            source_id: source_id.into(),
            target_id,
            retries: 0,
            status: SyncItemStatus::Pending,
        }
    }
}

/// Index of the first pending item, scanning from the front.
///
/// This is the scan order the tick loop relies on: an item that failed and
/// stayed pending is reattempted only after the scan passes every pending
/// item ahead of it.
pub fn first_pending(queue: &[SyncQueueItem]) -> Option<usize> {
    queue
        .iter()
        .position(|item| item.status == SyncItemStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_items_start_clean() {
        let item = SyncQueueItem::pending("B0AAAA", 7);
        assert_eq!(item.retries, 0);
        assert_eq!(item.status, SyncItemStatus::Pending);
        assert!(!item.status.is_terminal());
    }

    #[test]
    fn first_pending_scans_from_the_front() {
        let mut queue = vec![
            SyncQueueItem::pending("a", 1),
            SyncQueueItem::pending("b", 2),
            SyncQueueItem::pending("c", 3),
        ];
        queue[0].status = SyncItemStatus::Success;
        assert_eq!(first_pending(&queue), Some(1));

        queue[1].status = SyncItemStatus::Failed;
        assert_eq!(first_pending(&queue), Some(2));

        queue[2].status = SyncItemStatus::Success;
        assert_eq!(first_pending(&queue), None);
    }
}
