// Signal Emitter
// Drives the periodic scoring cycle over the watch list and serves on-demand requests

use anyhow::{Context, Result};
use chrono::Utc;
use common::{normalize_symbol, ClientRequest, InstrumentTable, OutboundMessage, PairInfo, Signal};
use dashmap::DashMap;
use data_ingestion::{BarStore, TickSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::bus::SignalBus;
use crate::scoring::ScoringEngine;

pub const DEFAULT_MARKET: &str = "binary";
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Normalized instrument symbols, in request-default order
    pub watch_list: Vec<String>,
    pub interval: Duration,
    pub default_market: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            watch_list: vec!["BTCUSDT".into(), "EURUSD".into(), "USDJPY".into()],
            interval: DEFAULT_EMIT_INTERVAL,
            default_market: DEFAULT_MARKET.to_string(),
        }
    }
}

/// Per-cycle tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub emitted: usize,
    /// Not enough base bars yet
    pub insufficient: usize,
    /// A previous cycle for the instrument was still running
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstrumentOutcome {
    Emitted,
    Insufficient,
    Skipped,
}

pub struct SignalEmitter {
    engine: Arc<ScoringEngine>,
    store: Arc<BarStore>,
    bus: Arc<SignalBus>,
    instruments: Arc<InstrumentTable>,
    source: Option<Arc<dyn TickSource>>,
    config: EmitterConfig,
    cycle_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SignalEmitter {
    pub fn new(
        engine: Arc<ScoringEngine>,
        store: Arc<BarStore>,
        bus: Arc<SignalBus>,
        instruments: Arc<InstrumentTable>,
        mut config: EmitterConfig,
    ) -> Self {
        config.watch_list = config.watch_list.iter().map(|s| normalize_symbol(s)).collect();
        Self {
            engine,
            store,
            bus,
            instruments,
            source: None,
            config,
            cycle_locks: DashMap::new(),
        }
    }

    /// Feed thin series from `source` before scoring
    pub fn with_tick_source(mut self, source: Arc<dyn TickSource>) -> Self {
        info!("Using tick source fallback: {}", source.name());
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Run cycles on the configured interval until `shutdown` resolves.
    pub async fn run<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Signal emitter started: {} instruments every {:?}",
            self.config.watch_list.len(),
            self.config.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Signal emitter stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle().await;
                    debug!("Cycle finished: {:?}", report);
                }
            }
        }
    }

    /// One pass over the watch list; instruments are handled concurrently.
    pub async fn run_cycle(self: &Arc<Self>) -> CycleReport {
        let mut tasks = JoinSet::new();
        for symbol in &self.config.watch_list {
            let emitter = Arc::clone(self);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let outcome = emitter.cycle_instrument(&symbol).await;
                (symbol, outcome)
            });
        }

        let mut report = CycleReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(InstrumentOutcome::Emitted))) => report.emitted += 1,
                Ok((_, Ok(InstrumentOutcome::Insufficient))) => report.insufficient += 1,
                Ok((_, Ok(InstrumentOutcome::Skipped))) => report.skipped += 1,
                Ok((symbol, Err(e))) => {
                    warn!("Cycle failed for {}: {:#}", symbol, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Cycle task aborted: {}", e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn cycle_instrument(&self, symbol: &str) -> Result<InstrumentOutcome> {
        let lock = self
            .cycle_locks
            .entry(symbol.to_string())
            .or_default()
            .clone();
        let Ok(_guard) = lock.try_lock() else {
            debug!("Previous cycle for {} still running, skipping", symbol);
            return Ok(InstrumentOutcome::Skipped);
        };

        if let Some(source) = &self.source {
            if self.store.len(symbol) < self.engine.config().min_base_bars {
                source
                    .top_up(symbol, &self.store, Utc::now().timestamp())
                    .with_context(|| format!("{} top-up failed for {}", source.name(), symbol))?;
            }
        }

        let Some(signal) = self.engine.score(symbol, &self.config.default_market).await else {
            return Ok(InstrumentOutcome::Insufficient);
        };

        let log_line = signal.log_line();
        self.bus.publish(&OutboundMessage::Signal(signal));
        self.bus.publish(&OutboundMessage::Log(log_line.clone()));
        info!("{}", log_line);
        Ok(InstrumentOutcome::Emitted)
    }

    /// Score immediately for a single caller; nothing is broadcast.
    pub async fn request_now(&self, instrument: Option<&str>, market: Option<&str>) -> Option<Signal> {
        let symbol = match instrument {
            Some(instrument) => normalize_symbol(instrument),
            None => self.config.watch_list.first()?.clone(),
        };
        let market = market.unwrap_or(&self.config.default_market);
        self.engine.score(&symbol, market).await
    }

    pub async fn handle_request(&self, request: ClientRequest) -> Option<OutboundMessage> {
        match request {
            ClientRequest::SignalNow { instrument, market } => self
                .request_now(instrument.as_deref(), market.as_deref())
                .await
                .map(OutboundMessage::Signal),
        }
    }

    /// Parse and answer a raw client message. Malformed input yields nothing.
    pub async fn handle_raw_request(&self, raw: &str) -> Option<OutboundMessage> {
        match serde_json::from_str::<ClientRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                debug!("Ignoring malformed client message: {}", e);
                None
            }
        }
    }

    /// Watched instruments with their category and data availability
    pub fn watchlist(&self) -> Vec<PairInfo> {
        self.config
            .watch_list
            .iter()
            .map(|symbol| PairInfo {
                symbol: symbol.clone(),
                category: self.instruments.resolve(symbol).category,
                available: self.source.is_some() || self.store.len(symbol) > 0,
            })
            .collect()
    }
}
