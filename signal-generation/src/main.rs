use anyhow::{Context, Result};
use data_ingestion::{BarStore, SyntheticTickSource};
use signal_generation::{
    ScoringEngine, ServiceConfig, SignalBus, SignalEmitter, SignalHistory, SignalStorage,
};
use std::sync::Arc;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = ServiceConfig::load().context("failed to load service configuration")?;

    info!("🚀 Starting signal service, watching: {}", config.watch_list.join(","));

    let store = Arc::new(BarStore::new(config.bar_store_config()));
    let instruments = Arc::new(config.instrument_table());
    let history = Arc::new(SignalHistory::new(config.history_capacity));
    let bus = Arc::new(SignalBus::new());

    let engine = Arc::new(ScoringEngine::new(
        store.clone(),
        history.clone(),
        instruments.clone(),
        config.scoring.clone(),
    ));

    let mut emitter = SignalEmitter::new(
        engine,
        store.clone(),
        bus.clone(),
        instruments.clone(),
        config.emitter_config(),
    );
    if config.synthetic_fallback {
        emitter = emitter.with_tick_source(Arc::new(SyntheticTickSource::new(instruments.clone())));
    }
    let emitter = Arc::new(emitter);

    for pair in emitter.watchlist() {
        info!("  {} ({:?}) available: {}", pair.symbol, pair.category, pair.available);
    }

    // Stand-in client: drains the bus so published messages are visible in the log
    let mut subscription = bus.subscribe();
    let drain = tokio::spawn(async move {
        while let Some(message) = subscription.rx.recv().await {
            tracing::debug!("-> {}", message);
        }
    });

    emitter
        .clone()
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    info!("👋 Shutting down gracefully...");
    drain.abort();

    let stats = history.stats().await?;
    info!(
        "Emitted {} signals this session (history capacity {})",
        stats.total_signals, stats.capacity
    );
    Ok(())
}
