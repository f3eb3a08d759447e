//! Syncgate daemon.
//!
//! Wires configuration, the file-backed store, the provider selector, and
//! the tokio scheduler into a running gateway + sync engine, then waits for
//! ctrl-c.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use syncgate::adapters::provider::ProviderSelector;
use syncgate::adapters::scheduler::{HookFuture, TokioScheduler};
use syncgate::adapters::storage::FileStore;
use syncgate::application::{SyncEngine, UsageLedger, LedgerDefaults, RUN_HOOK, TICK_HOOK};
use syncgate::config::AppConfig;
use syncgate::domain::foundation::Timestamp;
use syncgate::ports::{KeyValueStore, TickScheduler};

const EXPIRY_SWEEP_HOOK: &str = "syncgate_expiry_sweep";
const EXPIRY_SWEEP_INTERVAL_SECS: u64 = 86_400;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syncgate=info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.data_dir));
    let provider = ProviderSelector::new(config.provider.settings()).select();
    info!(provider = provider.provider_name(), "provider selected");

    let scheduler = Arc::new(TokioScheduler::new());
    let ledger = Arc::new(UsageLedger::with_defaults(
        Arc::clone(&store),
        LedgerDefaults {
            gb_limit: config.gateway.gb_limit,
            trial_days: config.gateway.trial_days,
            cycle_start_day: config.gateway.cycle_start_day,
        },
    ));
    let engine = Arc::new(SyncEngine::with_config(
        Arc::clone(&store),
        provider,
        Arc::clone(&scheduler) as Arc<dyn TickScheduler>,
        config.sync.engine_config(),
    ));

    register_hooks(&scheduler, &engine, &ledger).await;

    engine.save_config(config.sync.frequency()).await?;
    scheduler
        .schedule_recurring(EXPIRY_SWEEP_HOOK, EXPIRY_SWEEP_INTERVAL_SECS)
        .await?;

    info!("syncgate running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

async fn register_hooks(
    scheduler: &Arc<TokioScheduler>,
    engine: &Arc<SyncEngine>,
    ledger: &Arc<UsageLedger>,
) {
    let tick_engine = Arc::clone(engine);
    scheduler
        .register_handler(
            TICK_HOOK,
            Arc::new(move || {
                let engine = Arc::clone(&tick_engine);
                Box::pin(async move {
                    if let Err(e) = engine.tick().await {
                        error!(error = %e, "sync tick failed");
                    }
                }) as HookFuture
            }),
        )
        .await;

    let run_engine = Arc::clone(engine);
    scheduler
        .register_handler(
            RUN_HOOK,
            Arc::new(move || {
                let engine = Arc::clone(&run_engine);
                Box::pin(async move {
                    match engine.start_run().await {
                        Ok(stats) => info!(total = stats.total, "scheduled sync run started"),
                        Err(e) => info!(reason = %e, "scheduled sync run skipped"),
                    }
                }) as HookFuture
            }),
        )
        .await;

    let sweep_ledger = Arc::clone(ledger);
    scheduler
        .register_handler(
            EXPIRY_SWEEP_HOOK,
            Arc::new(move || {
                let ledger = Arc::clone(&sweep_ledger);
                Box::pin(async move {
                    match ledger.check_expired_licenses(Timestamp::now()).await {
                        Ok(expired) if expired > 0 => {
                            info!(expired, "expiry sweep transitioned licenses")
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "expiry sweep failed"),
                    }
                }) as HookFuture
            }),
        )
        .await;
}
