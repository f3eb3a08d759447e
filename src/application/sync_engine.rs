//! Progressive synchronization engine.
//!
//! Refreshes every tracked catalog item from the upstream provider, one
//! item per tick with a fixed delay between ticks. Processing exactly one
//! item per tick bounds the worst-case instantaneous load on the shared
//! upstream and on the tenant's own quota, independent of queue size.
//!
//! The queue snapshot and run stats are persisted through the key/value
//! port so a tick can resume from the last known-good state after a
//! restart. The persisted `running` flag is the single-flight guard.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::catalog::CatalogItem;
use crate::domain::foundation::Timestamp;
use crate::domain::sync::{
    first_pending, SyncFrequency, SyncItemStatus, SyncQueueItem, SyncRunStats, SyncRunSummary,
};
use crate::ports::{
    DataProvider, KeyValueStore, KeyValueStoreExt, ProviderError, ScheduleError, StoreError,
    TickScheduler,
};

/// Hook fired by the recurring run trigger.
pub const RUN_HOOK: &str = "syncgate_run";
/// Hook fired for each queue tick.
pub const TICK_HOOK: &str = "syncgate_tick";

const QUEUE_KEY: &str = "sync:queue";
const STATS_KEY: &str = "sync:stats";
const RUN_LOG_KEY: &str = "sync:run_log";
const FREQUENCY_KEY: &str = "sync:frequency";
const CATALOG_PREFIX: &str = "catalog:item:";

const RUN_LOG_CAP: usize = 50;

/// Rough payload size of one refresh, for quota estimates.
const ESTIMATED_BYTES_PER_REFRESH: u64 = 200_000;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncEngineConfig {
    /// Delay before the first tick of a run.
    pub first_tick_delay_secs: u64,
    /// Fixed delay between consecutive ticks.
    pub item_delay_secs: u64,
    /// Attempts per item before it is marked failed.
    pub max_retries: u32,
    /// Bounded timeout for one upstream refresh.
    pub request_timeout_secs: u64,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            first_tick_delay_secs: 10,
            item_delay_secs: 40,
            max_retries: 2,
            request_timeout_secs: 15,
        }
    }
}

/// Errors from the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A run is already in progress; the single-flight guard rejected the
    /// trigger.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Operator-facing snapshot of the sync subsystem.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncInfo {
    /// Configured run cadence.
    pub frequency: SyncFrequency,
    /// Human-readable cadence label.
    pub label: String,
    /// Tracked catalog items.
    pub item_count: u32,
    /// Whether a run is live right now.
    pub is_running: bool,
    /// Completion percentage of the live (or last) run.
    pub progress_percent: u8,
    /// Summary of the most recently completed run.
    pub last_run: Option<SyncRunSummary>,
    /// Next automatic run, when one is scheduled.
    pub next_run: Option<Timestamp>,
    /// Estimated bytes one full run will consume.
    pub estimated_bytes: u64,
}

/// One-item-per-tick refresh engine.
pub struct SyncEngine {
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn DataProvider>,
    scheduler: Arc<dyn TickScheduler>,
    config: SyncEngineConfig,
}

impl SyncEngine {
    /// Creates an engine with default tuning.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn DataProvider>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        Self::with_config(store, provider, scheduler, SyncEngineConfig::default())
    }

    /// Creates an engine with explicit tuning.
    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn DataProvider>,
        scheduler: Arc<dyn TickScheduler>,
        config: SyncEngineConfig,
    ) -> Self {
        Self {
            store,
            provider,
            scheduler,
            config,
        }
    }

    // ─── Catalog tracking ────────────────────────────────────────────

    /// Registers (or replaces) a tracked catalog item.
    pub async fn track_item(&self, item: &CatalogItem) -> Result<(), SyncError> {
        let key = format!("{CATALOG_PREFIX}{}", item.target_id);
        self.store.set_typed(&key, item).await?;
        Ok(())
    }

    /// Every tracked catalog item, in key order.
    pub async fn tracked_items(&self) -> Result<Vec<CatalogItem>, SyncError> {
        let keys = self.store.keys_with_prefix(CATALOG_PREFIX).await?;
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = self.store.get_typed::<CatalogItem>(&key).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    // ─── Run lifecycle ───────────────────────────────────────────────

    /// Starts a refresh run over every tracked item.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] while a run is live; the
    /// in-progress run keeps its state.
    pub async fn start_run(&self) -> Result<SyncRunStats, SyncError> {
        if let Some(stats) = self.load_stats().await? {
            if stats.running {
                return Err(SyncError::AlreadyRunning);
            }
        }

        let items = self.tracked_items().await?;
        let queue: Vec<SyncQueueItem> = items
            .iter()
            .map(|item| SyncQueueItem::pending(item.source_id.clone(), item.target_id))
            .collect();
        let stats = SyncRunStats::started(queue.len() as u32);

        self.store.set_typed(QUEUE_KEY, &queue).await?;
        self.store.set_typed(STATS_KEY, &stats).await?;
        self.scheduler
            .schedule_one_shot(TICK_HOOK, self.config.first_tick_delay_secs)
            .await?;

        info!(total = stats.total, "sync run started");
        Ok(stats)
    }

    /// Processes one queue item and reschedules or finishes the run.
    ///
    /// A tick with no persisted run, or one whose run is not live, is a
    /// no-op; a tick over an empty or fully terminal queue finishes the
    /// run. Storage failures abort the tick before any persisted mutation,
    /// so the next tick retries from the last known-good snapshot.
    pub async fn tick(&self) -> Result<(), SyncError> {
        let Some(mut stats) = self.load_stats().await? else {
            return Ok(());
        };
        if !stats.running {
            return Ok(());
        }

        let mut queue: Vec<SyncQueueItem> =
            self.store.get_typed(QUEUE_KEY).await?.unwrap_or_default();

        let Some(index) = first_pending(&queue) else {
            return self.finish_run(&mut stats).await;
        };

        let source_id = queue[index].source_id.clone();
        let target_id = queue[index].target_id;

        match self.refresh_one(&source_id, target_id).await {
            Ok(()) => {
                queue[index].status = SyncItemStatus::Success;
                stats.success += 1;
                stats.processed += 1;
                debug!(source_id = %source_id, "item refreshed");
            }
            Err(RefreshFailure::Storage(e)) => {
                // Fatal to this tick only; leave the snapshot untouched.
                return Err(e.into());
            }
            Err(RefreshFailure::Provider(e)) => {
                queue[index].retries += 1;
                if queue[index].retries >= self.config.max_retries {
                    queue[index].status = SyncItemStatus::Failed;
                    stats.failed += 1;
                    stats.processed += 1;
                    warn!(
                        source_id = %source_id,
                        retries = queue[index].retries,
                        error = %e,
                        "item failed permanently this run"
                    );
                } else {
                    warn!(
                        source_id = %source_id,
                        retries = queue[index].retries,
                        error = %e,
                        "item refresh failed, will retry"
                    );
                }
            }
        }

        self.store.set_typed(QUEUE_KEY, &queue).await?;
        self.store.set_typed(STATS_KEY, &stats).await?;

        if first_pending(&queue).is_some() {
            self.scheduler
                .schedule_one_shot(TICK_HOOK, self.config.item_delay_secs)
                .await?;
        } else {
            self.finish_run(&mut stats).await?;
        }
        Ok(())
    }

    /// Stops a live run by clearing the queue and the running flag.
    ///
    /// Any already-scheduled stray tick then finds nothing to do.
    pub async fn stop_run(&self) -> Result<(), SyncError> {
        self.store.delete(QUEUE_KEY).await?;
        if let Some(mut stats) = self.load_stats().await? {
            if stats.running {
                stats.finish();
                self.store.set_typed(STATS_KEY, &stats).await?;
                info!("sync run stopped");
            }
        }
        self.scheduler.clear(TICK_HOOK).await?;
        Ok(())
    }

    async fn finish_run(&self, stats: &mut SyncRunStats) -> Result<(), SyncError> {
        stats.finish();
        self.store.set_typed(STATS_KEY, stats).await?;
        self.store.delete(QUEUE_KEY).await?;

        if let Some(summary) = SyncRunSummary::from_stats(stats) {
            let mut log: Vec<SyncRunSummary> = self
                .store
                .get_typed(RUN_LOG_KEY)
                .await?
                .unwrap_or_default();
            log.push(summary);
            if log.len() > RUN_LOG_CAP {
                let excess = log.len() - RUN_LOG_CAP;
                log.drain(..excess);
            }
            self.store.set_typed(RUN_LOG_KEY, &log).await?;
        }

        info!(
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            "sync run finished"
        );
        Ok(())
    }

    async fn refresh_one(&self, source_id: &str, target_id: u64) -> Result<(), RefreshFailure> {
        let deadline = Duration::from_secs(self.config.request_timeout_secs);
        let fetched = match timeout(deadline, self.provider.get_by_identifier(source_id)).await {
            Ok(Ok(item)) => item,
            Ok(Err(e)) => return Err(RefreshFailure::Provider(e)),
            Err(_) => {
                return Err(RefreshFailure::Provider(ProviderError::Timeout {
                    timeout_secs: self.config.request_timeout_secs,
                }))
            }
        };

        let key = format!("{CATALOG_PREFIX}{target_id}");
        let mut local: CatalogItem = self
            .store
            .get_typed(&key)
            .await
            .map_err(RefreshFailure::Storage)?
            .unwrap_or_else(|| CatalogItem::new(source_id, target_id, fetched.title.clone()));
        local.apply_refresh(&fetched);
        self.store
            .set_typed(&key, &local)
            .await
            .map_err(RefreshFailure::Storage)?;
        Ok(())
    }

    // ─── Status & configuration ──────────────────────────────────────

    /// Stats of the live or most recent run.
    pub async fn status(&self) -> Result<Option<SyncRunStats>, SyncError> {
        self.load_stats().await
    }

    /// Completed-run summaries, oldest first, capped.
    pub async fn run_log(&self) -> Result<Vec<SyncRunSummary>, SyncError> {
        Ok(self.store.get_typed(RUN_LOG_KEY).await?.unwrap_or_default())
    }

    /// Operator-facing snapshot: cadence, progress, next/last run, and the
    /// estimated quota cost of a full run.
    pub async fn sync_info(&self) -> Result<SyncInfo, SyncError> {
        let frequency = self.frequency().await?;
        let stats = self.load_stats().await?;
        let item_count = self.store.keys_with_prefix(CATALOG_PREFIX).await?.len() as u32;
        let log = self.run_log().await?;

        Ok(SyncInfo {
            frequency,
            label: frequency.label().to_string(),
            item_count,
            is_running: stats.as_ref().is_some_and(|s| s.running),
            progress_percent: stats.as_ref().map_or(0, |s| s.progress_percent()),
            last_run: log.last().cloned(),
            next_run: self.scheduler.next_scheduled(RUN_HOOK).await,
            estimated_bytes: u64::from(item_count) * ESTIMATED_BYTES_PER_REFRESH,
        })
    }

    /// Configured run cadence.
    pub async fn frequency(&self) -> Result<SyncFrequency, SyncError> {
        let code: Option<String> = self.store.get_typed(FREQUENCY_KEY).await?;
        Ok(code
            .map(|c| SyncFrequency::from_code(&c))
            .unwrap_or_default())
    }

    /// Persists the run cadence and re-registers the recurring trigger.
    pub async fn save_config(&self, frequency: SyncFrequency) -> Result<(), SyncError> {
        self.store
            .set_typed(FREQUENCY_KEY, &frequency.code().to_string())
            .await?;

        self.scheduler.clear(RUN_HOOK).await?;
        if let Some(interval) = frequency.interval_secs() {
            self.scheduler.schedule_recurring(RUN_HOOK, interval).await?;
        }
        info!(frequency = %frequency, "sync cadence saved");
        Ok(())
    }

    async fn load_stats(&self) -> Result<Option<SyncRunStats>, SyncError> {
        Ok(self.store.get_typed(STATS_KEY).await?)
    }
}

enum RefreshFailure {
    Provider(ProviderError),
    Storage(StoreError),
}
