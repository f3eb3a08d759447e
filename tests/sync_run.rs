//! End-to-end sync runs: snapshot, tick-by-tick progress, retries, run
//! accounting, and provider selection across deployment modes.

use std::sync::Arc;

use syncgate::adapters::provider::{
    DeploymentMode, MockDataProvider, ProviderSelector, ProviderSettings, OFFICIAL_API_STRATEGY,
};
use syncgate::adapters::scheduler::InMemoryScheduler;
use syncgate::adapters::storage::InMemoryStore;
use syncgate::application::{SyncEngine, SyncError};
use syncgate::domain::catalog::CatalogItem;
use syncgate::domain::sync::SyncFrequency;
use syncgate::ports::{DataProvider, TickScheduler};

fn engine_with(provider: MockDataProvider) -> (SyncEngine, Arc<MockDataProvider>) {
    let provider = Arc::new(provider);
    let engine = SyncEngine::new(
        Arc::new(InMemoryStore::new()),
        Arc::clone(&provider) as Arc<dyn DataProvider>,
        Arc::new(InMemoryScheduler::new()) as Arc<dyn TickScheduler>,
    );
    (engine, provider)
}

async fn drive(engine: &SyncEngine, max_ticks: usize) {
    for _ in 0..max_ticks {
        let Some(stats) = engine.status().await.unwrap() else {
            return;
        };
        if !stats.running {
            return;
        }
        engine.tick().await.unwrap();
    }
}

#[tokio::test]
async fn three_item_run_with_one_persistent_failure() {
    // Queue of 3 where item #2 always fails: success=2, failed=1,
    // processed=3, every item in exactly one terminal state.
    let (engine, provider) = engine_with(MockDataProvider::new().with_failing("item-2"));
    for (i, id) in ["item-1", "item-2", "item-3"].iter().enumerate() {
        engine
            .track_item(&CatalogItem::new(*id, i as u64 + 1, "stale"))
            .await
            .unwrap();
    }

    engine.start_run().await.unwrap();
    drive(&engine, 9).await;

    let stats = engine.status().await.unwrap().unwrap();
    assert!(!stats.running);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processed, stats.success + stats.failed);

    // item-2 was attempted exactly max_retries times
    let attempts = provider
        .calls()
        .iter()
        .filter(|c| c.as_str() == "item-2")
        .count();
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn manual_trigger_during_a_run_reports_already_running() {
    let (engine, _provider) = engine_with(MockDataProvider::new());
    engine
        .track_item(&CatalogItem::new("a", 1, "stale"))
        .await
        .unwrap();

    engine.start_run().await.unwrap();
    assert!(matches!(engine.start_run().await, Err(SyncError::AlreadyRunning)));

    drive(&engine, 5).await;
    // Once finished, a new run is accepted again.
    assert!(engine.start_run().await.is_ok());
}

#[tokio::test]
async fn completed_runs_leave_exactly_one_log_entry_each() {
    let (engine, _provider) = engine_with(MockDataProvider::new());
    engine
        .track_item(&CatalogItem::new("a", 1, "stale"))
        .await
        .unwrap();

    engine.start_run().await.unwrap();
    drive(&engine, 5).await;
    engine.start_run().await.unwrap();
    drive(&engine, 5).await;

    let log = engine.run_log().await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|entry| entry.finished_at >= entry.started_at));
}

#[tokio::test]
async fn refreshed_data_lands_in_the_catalog() {
    let mut fresh = CatalogItem::new("a", 0, "Fresh");
    fresh.price_cents = Some(2499);
    fresh.currency = Some("USD".to_string());

    let (engine, _provider) = engine_with(MockDataProvider::new().with_item(fresh));
    engine
        .track_item(&CatalogItem::new("a", 7, "Stale"))
        .await
        .unwrap();

    engine.start_run().await.unwrap();
    drive(&engine, 5).await;

    let items = engine.tracked_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].target_id, 7);
    assert_eq!(items[0].title, "Fresh");
    assert_eq!(items[0].price_cents, Some(2499));
}

#[tokio::test]
async fn cadence_config_round_trips_through_the_engine() {
    let (engine, _provider) = engine_with(MockDataProvider::new());

    engine.save_config(SyncFrequency::Every14Days).await.unwrap();
    let info = engine.sync_info().await.unwrap();
    assert_eq!(info.frequency, SyncFrequency::Every14Days);
    assert_eq!(info.label, "Every 14 days");
    assert!(info.next_run.is_some());

    engine.save_config(SyncFrequency::Off).await.unwrap();
    let info = engine.sync_info().await.unwrap();
    assert_eq!(info.frequency, SyncFrequency::Off);
    assert!(info.next_run.is_none());
}

#[tokio::test]
async fn client_mode_routes_item_lookups_to_the_remote_gateway() {
    // Even with a local strategy key configured, client mode must select
    // the remote proxy for every capability.
    let settings = ProviderSettings {
        mode: DeploymentMode::Client,
        strategy: Some(OFFICIAL_API_STRATEGY.to_string()),
        ..ProviderSettings::default()
    };
    let provider = ProviderSelector::new(settings).select();
    assert_eq!(provider.provider_name(), "remote-gateway");

    // And the one capability a client cannot serve comes back empty rather
    // than erroring.
    let settings = ProviderSettings {
        mode: DeploymentMode::Client,
        gateway_license_key: Some(secrecy::SecretString::new("sg_key".to_string())),
        ..ProviderSettings::default()
    };
    let provider = ProviderSelector::new(settings).select();
    let offers = provider.list_current_offers(1).await.unwrap();
    assert!(offers.items.is_empty());
}
