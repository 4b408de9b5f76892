// End-to-end: ticks in, signals out over the bus and into history

use common::{InstrumentCategory, InstrumentMeta, InstrumentTable, OutboundMessage, Signal};
use data_ingestion::{resample, BarStore, BarStoreConfig};
use serde_json::Value;
use signal_generation::{
    BoostPolicy, EmitterConfig, ScoringConfig, ScoringEngine, SignalBus, SignalEmitter,
    SignalHistory, SignalStorage,
};
use std::sync::Arc;
use std::time::Duration;

const T0: i64 = 1_700_000_400;

struct Service {
    store: Arc<BarStore>,
    history: Arc<SignalHistory>,
    bus: Arc<SignalBus>,
    emitter: Arc<SignalEmitter>,
}

fn service(watch: &[&str], history_capacity: usize) -> Service {
    let store = Arc::new(BarStore::new(BarStoreConfig {
        stride_secs: 1,
        retention: 600,
    }));
    let history = Arc::new(SignalHistory::new(history_capacity));
    let bus = Arc::new(SignalBus::new());
    let instruments = Arc::new(InstrumentTable::new(vec![
        InstrumentMeta::new("BTCUSDT", InstrumentCategory::Crypto, 0),
        InstrumentMeta::new("EURUSD", InstrumentCategory::Forex, 4),
        InstrumentMeta::new("USDJPY", InstrumentCategory::Forex, 4),
    ]));
    let engine = Arc::new(ScoringEngine::new(
        store.clone(),
        history.clone(),
        instruments.clone(),
        ScoringConfig {
            boost_policy: BoostPolicy::MinConfidence { threshold: 60 },
            ..ScoringConfig::default()
        },
    ));
    let emitter = Arc::new(SignalEmitter::new(
        engine,
        store.clone(),
        bus.clone(),
        instruments,
        EmitterConfig {
            watch_list: watch.iter().map(|s| s.to_string()).collect(),
            interval: Duration::from_secs(5),
            default_market: "binary".into(),
        },
    ));
    Service {
        store,
        history,
        bus,
        emitter,
    }
}

/// Several ticks per second for `seconds` seconds
fn stream(store: &BarStore, instrument: &str, seconds: i64, base: f64) {
    for s in 0..seconds {
        for k in 0..4 {
            let price = base + (s as f64) * 0.0001 + (k as f64 - 1.5) * 0.00002;
            store.ingest(instrument, price, 1.0 + k as f64, T0 + s).unwrap();
        }
    }
}

#[tokio::test]
async fn test_ticks_become_published_signals() {
    let svc = service(&["EURUSD", "USDJPY"], 100);
    stream(&svc.store, "EURUSD", 45, 1.0900);
    stream(&svc.store, "USDJPY", 12, 150.10);
    let mut sub = svc.bus.subscribe();

    let report = svc.emitter.run_cycle().await;
    assert_eq!(report.emitted, 1);
    assert_eq!(report.insufficient, 1);

    let signal_msg: Value = serde_json::from_str(&sub.rx.recv().await.unwrap()).unwrap();
    assert_eq!(signal_msg["type"], "signal");
    let data = &signal_msg["data"];
    assert_eq!(data["instrument"], "EURUSD");
    assert_eq!(data["market"], "binary");
    let confidence = data["confidence"].as_u64().unwrap();
    assert!((10..=99).contains(&confidence));
    assert!(data["direction"] == "CALL" || data["direction"] == "PUT");

    let log_msg: Value = serde_json::from_str(&sub.rx.recv().await.unwrap()).unwrap();
    assert_eq!(log_msg["type"], "log");
    assert_eq!(
        log_msg["data"],
        format!("Signal EURUSD {} conf:{}", data["direction"].as_str().unwrap(), confidence)
    );

    let decoded: Signal = serde_json::from_value(data.clone()).unwrap();
    let stored = svc.history.get(decoded.id).await.unwrap().unwrap();
    assert_eq!(stored, decoded);
    assert_eq!(stored.boosted, stored.confidence >= 60);
}

#[tokio::test]
async fn test_on_demand_request_reply() {
    let svc = service(&["EURUSD"], 100);
    stream(&svc.store, "EURUSD", 30, 1.0900);
    let mut sub = svc.bus.subscribe();

    let reply = svc
        .emitter
        .handle_raw_request(r#"{"type":"reqSignalNow","market":"turbo"}"#)
        .await;
    let Some(OutboundMessage::Signal(signal)) = reply else {
        panic!("expected a signal reply");
    };
    assert_eq!(signal.instrument, "EURUSD");
    assert_eq!(signal.market, "turbo");
    assert_eq!((signal.expires_at - signal.emitted_at).num_seconds(), 60);
    assert!(signal.entry_range.low < signal.entry_range.high);
    assert!(signal.entry_range.low.scale() <= 4);

    // replies go to the requester only
    assert!(sub.rx.try_recv().is_err());
    assert_eq!(svc.history.len().await, 1);
}

#[tokio::test]
async fn test_history_stays_bounded_across_cycles() {
    let svc = service(&["EURUSD", "BTCUSDT"], 5);
    stream(&svc.store, "EURUSD", 40, 1.0900);
    for s in 0..40 {
        svc.store
            .ingest("BTCUSDT", 110_000.0 + s as f64, 0.5, T0 + s)
            .unwrap();
    }

    for _ in 0..4 {
        assert_eq!(svc.emitter.run_cycle().await.emitted, 2);
    }

    let recent = svc.history.recent(50).await.unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(svc.history.stats().await.unwrap().total_signals, 5);
    let btc = svc.history.by_instrument("btcusdt", 50).await.unwrap();
    assert!(!btc.is_empty());
    assert!(btc.iter().all(|s| s.instrument == "BTCUSDT"));
}

#[tokio::test]
async fn test_fast_series_matches_resampled_store() {
    let svc = service(&["EURUSD"], 10);
    stream(&svc.store, "EURUSD", 150, 1.0900);

    let base = svc.store.snapshot("EURUSD");
    assert_eq!(base.len(), 150);
    let fast = resample(&base, 60);
    // 1_700_000_400 is minute aligned: 60 + 60 + 30
    assert_eq!(fast.len(), 3);
    assert_eq!(fast[0].open, base[0].open);
    assert_eq!(fast[2].close, base[149].close);
    let volume: f64 = base.iter().map(|b| b.volume).sum();
    assert!((fast.iter().map(|b| b.volume).sum::<f64>() - volume).abs() < 1e-9);
}
