// Example: Multi-timeframe Scoring
// Feeds synthetic ticks into a bar store, scores them and prints the published messages

use common::{InstrumentCategory, InstrumentMeta, InstrumentTable};
use data_ingestion::{resample, BarStore, SyntheticTickSource, TickSource};
use signal_generation::{
    order_block, BoostPolicy, EmitterConfig, PatternContext, ScoringConfig, ScoringEngine,
    SignalBus, SignalEmitter, SignalHistory, SignalStorage,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Signal Generation - Multi-timeframe Scoring Example ===\n");

    let instruments = Arc::new(InstrumentTable::new(vec![
        InstrumentMeta::new("EURUSD", InstrumentCategory::Forex, 4).with_feed(1.09, 0.0012, 100.0),
        InstrumentMeta::new("BTCUSDT", InstrumentCategory::Crypto, 0).with_feed(110_000.0, 200.0, 1.0),
    ]));
    let store = Arc::new(BarStore::default());
    let history = Arc::new(SignalHistory::new(50));
    let bus = Arc::new(SignalBus::new());

    // Ten minutes of one-second bars from the seeded synthetic feed
    let source = SyntheticTickSource::with_seed(instruments.clone(), 42);
    let start = chrono::Utc::now().timestamp() - 600;
    for second in 0..600 {
        for symbol in ["EURUSD", "BTCUSDT"] {
            source.top_up(symbol, &store, start + second)?;
        }
    }

    let base = store.snapshot("EURUSD");
    let fast = resample(&base, 60);
    let slow = resample(&base, 300);
    println!("EURUSD: {} base bars, {} M1 bars, {} M5 bars", base.len(), fast.len(), slow.len());
    if let Some(bar) = fast.last() {
        println!(
            "  last M1: O {:.4} H {:.4} L {:.4} C {:.4} V {:.1}",
            bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }
    println!();

    let config = ScoringConfig {
        boost_policy: BoostPolicy::MinConfidence { threshold: 70 },
        ..ScoringConfig::default()
    };
    let engine = ScoringEngine::new(store.clone(), history.clone(), instruments.clone(), config)
        .with_pattern(Box::new(order_block(|ctx: &PatternContext<'_>| {
            // Last M1 bar closed back inside the previous bar's range
            match ctx.fast {
                [.., prev, last] => last.close > prev.low && last.close < prev.high,
                _ => false,
            }
        })));

    let emitter = Arc::new(SignalEmitter::new(
        Arc::new(engine),
        store.clone(),
        bus.clone(),
        instruments,
        EmitterConfig {
            watch_list: vec!["EURUSD".into(), "BTCUSDT".into()],
            interval: Duration::from_secs(5),
            default_market: "binary".into(),
        },
    ));

    println!("Watch list:");
    for pair in emitter.watchlist() {
        println!("  {} ({:?}) available: {}", pair.symbol, pair.category, pair.available);
    }
    println!();

    let mut subscription = bus.subscribe();
    let report = emitter.run_cycle().await;
    println!("Cycle: {:?}", report);
    while let Ok(message) = subscription.rx.try_recv() {
        println!("  -> {}", message);
    }
    println!();

    if let Some(reply) = emitter
        .handle_raw_request(r#"{"type":"reqSignalNow","symbol":"btcusdt","market":"turbo"}"#)
        .await
    {
        println!("On-demand reply: {}", reply.to_json()?);
    }
    println!();

    println!("History (newest first):");
    for signal in history.recent(10).await? {
        println!(
            "  {} {} conf {} entry {} boosted {} | {}",
            signal.instrument,
            signal.direction,
            signal.confidence,
            signal.entry_range,
            signal.boosted,
            signal.notes
        );
    }

    let stats = history.stats().await?;
    println!("\nStored {} of {} signals", stats.total_signals, stats.capacity);
    Ok(())
}
