// Multi-timeframe Scoring Engine
// Combines fast/slow trend, oscillator, volume, candle shape, structural
// patterns and round-price proximity into a bounded confidence score

use chrono::{DateTime, Duration, Utc};
use common::{normalize_symbol, Bar, Direction, EntryRange, InstrumentTable, Signal};
use data_ingestion::{resample, BarStore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::boost::{BoostPolicy, BoostSampler};
use crate::indicators::{rsi, sma, IndicatorResult};
use crate::patterns::{PatternContext, PatternDetector};
use crate::storage::SignalStorage;

pub const NEUTRAL_SCORE: i32 = 50;
pub const MIN_CONFIDENCE: u8 = 10;
pub const MAX_CONFIDENCE: u8 = 99;
/// Longest accepted signal lifetime: one day
pub const MAX_EXPIRY_SECS: i64 = 86_400;

/// Additive score adjustments, in confidence points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub fast_trend: i32,
    pub slow_trend: i32,
    pub oscillator: i32,
    pub volume_spike: i32,
    pub wick: i32,
    pub round_price: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fast_trend: 8,
            slow_trend: 6,
            oscillator: 10,
            volume_spike: 8,
            wick: 6,
            round_price: 4,
        }
    }
}

impl ScoringWeights {
    /// All terms disabled; useful for isolating a single term
    pub fn zero() -> Self {
        Self {
            fast_trend: 0,
            slow_trend: 0,
            oscillator: 0,
            volume_spike: 0,
            wick: 0,
            round_price: 0,
        }
    }
}

/// Configuration for the scoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base bars required before scoring is attempted
    pub min_base_bars: usize,
    pub fast_stride_secs: i64,
    pub slow_stride_secs: i64,
    /// Trailing closes fed to the indicators
    pub closes_lookback: usize,
    pub short_period: usize,
    pub long_period: usize,
    pub oscillator_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    /// Base bars averaged for the volume baseline
    pub volume_window: usize,
    pub volume_spike_multiplier: f64,
    /// Relative distance to the nearest integer counted as "round"
    pub round_tolerance: f64,
    pub call_threshold: u8,
    pub put_threshold: u8,
    /// Half-width of the entry band, relative to the last close
    pub entry_band: f64,
    pub expiry_secs: i64,
    pub weights: ScoringWeights,
    pub boost_policy: BoostPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_base_bars: 30,
            fast_stride_secs: 60,
            slow_stride_secs: 300,
            closes_lookback: 80,
            short_period: 5,
            long_period: 20,
            oscillator_period: 14,
            oversold: 35.0,
            overbought: 65.0,
            volume_window: 60,
            volume_spike_multiplier: 2.2,
            round_tolerance: 0.0005,
            call_threshold: 60,
            put_threshold: 40,
            entry_band: 0.001,
            expiry_secs: 60,
            weights: ScoringWeights::default(),
            boost_policy: BoostPolicy::default(),
        }
    }
}

/// Short-vs-long moving average comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// `Up` when short > long, `Down` otherwise; `None` if either is undefined.
    pub fn from_averages(short: Option<f64>, long: Option<f64>) -> Option<Self> {
        match (short, long) {
            (Some(short), Some(long)) if short > long => Some(Trend::Up),
            (Some(_), Some(_)) => Some(Trend::Down),
            _ => None,
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            Trend::Up => 1,
            Trend::Down => -1,
        }
    }
}

/// Every term that went into one score, kept for notes and tests
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub fast_trend: Option<Trend>,
    pub slow_trend: Option<Trend>,
    pub oscillator: Option<f64>,
    pub volume_spike: bool,
    pub upper_wick: f64,
    pub lower_wick: f64,
    pub patterns: Vec<String>,
    pub round_price: bool,
    pub last_close: f64,
    pub raw_score: i32,
    pub confidence: u8,
    pub direction: Direction,
}

impl ScoreBreakdown {
    pub fn notes(&self) -> String {
        let trend = |t: Option<Trend>| match t {
            Some(Trend::Up) => "up",
            Some(Trend::Down) => "down",
            None => "n/a",
        };
        let wick = if self.lower_wick > self.upper_wick {
            "lower"
        } else if self.upper_wick > self.lower_wick {
            "upper"
        } else {
            "flat"
        };

        let mut notes = format!(
            "Computed: fast {} | slow {} | rsi {} | vol {} | wick {}",
            trend(self.fast_trend),
            trend(self.slow_trend),
            self.oscillator
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "n/a".to_string()),
            if self.volume_spike { "spike" } else { "normal" },
            wick,
        );
        if !self.patterns.is_empty() {
            notes.push_str(&format!(" | patterns {}", self.patterns.join(",")));
        }
        if self.round_price {
            notes.push_str(" | round price");
        }
        notes
    }
}

/// Round and clamp a raw score into [10, 99].
pub fn clamp_confidence(raw: f64) -> u8 {
    if raw.is_nan() {
        return NEUTRAL_SCORE as u8;
    }
    raw.round()
        .clamp(MIN_CONFIDENCE as f64, MAX_CONFIDENCE as f64) as u8
}

/// CALL at or above `call_threshold`, PUT at or below `put_threshold`;
/// in between, follow the fast trend (PUT when it is down or undefined).
pub fn resolve_direction(
    confidence: u8,
    fast_trend: Option<Trend>,
    call_threshold: u8,
    put_threshold: u8,
) -> Direction {
    if confidence >= call_threshold {
        Direction::Call
    } else if confidence <= put_threshold {
        Direction::Put
    } else if fast_trend == Some(Trend::Up) {
        Direction::Call
    } else {
        Direction::Put
    }
}

/// Latest bar's volume against the mean of the trailing `window` bars
/// (latest included).
pub fn volume_spike(bars: &[Bar], window: usize, multiplier: f64) -> bool {
    let Some(last) = bars.last() else {
        return false;
    };
    let count = window.min(bars.len()).max(1);
    let mean = bars[bars.len() - count..]
        .iter()
        .map(|b| b.volume)
        .sum::<f64>()
        / count as f64;
    last.volume > mean * multiplier
}

/// True when `price` sits within `tolerance` (relative) of an integer.
pub fn near_round_price(price: f64, tolerance: f64) -> bool {
    (price.round() - price).abs() < price * tolerance
}

fn trailing_closes(bars: &[Bar], lookback: usize) -> Vec<f64> {
    let start = bars.len().saturating_sub(lookback);
    bars[start..].iter().map(|b| b.close).collect()
}

/// Scores instruments from the bar store and records results in history
pub struct ScoringEngine {
    store: Arc<BarStore>,
    history: Arc<dyn SignalStorage>,
    instruments: Arc<InstrumentTable>,
    patterns: Vec<Box<dyn PatternDetector>>,
    boost: BoostSampler,
    config: ScoringConfig,
    indicator_failures: AtomicU64,
}

impl ScoringEngine {
    pub fn new(
        store: Arc<BarStore>,
        history: Arc<dyn SignalStorage>,
        instruments: Arc<InstrumentTable>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            store,
            history,
            instruments,
            patterns: Vec::new(),
            boost: BoostSampler::new(config.boost_policy.clone()),
            config,
            indicator_failures: AtomicU64::new(0),
        }
    }

    /// Register a structural pattern detector
    pub fn with_pattern(mut self, detector: Box<dyn PatternDetector>) -> Self {
        info!("Adding pattern detector: {} ({:+})", detector.name(), detector.boost());
        self.patterns.push(detector);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Indicator evaluations that failed and were scored as neutral
    pub fn indicator_failures(&self) -> u64 {
        self.indicator_failures.load(Ordering::Relaxed)
    }

    pub async fn score(&self, instrument: &str, market: &str) -> Option<Signal> {
        self.score_at(instrument, market, Utc::now()).await
    }

    /// Score `instrument` as of `now`, store the result in history and return it.
    /// `None` means not enough data.
    pub async fn score_at(
        &self,
        instrument: &str,
        market: &str,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        let symbol = normalize_symbol(instrument);
        let bars = self.store.snapshot(&symbol);
        let breakdown = self.evaluate(&symbol, &bars)?;

        let precision = self.instruments.precision(&symbol);
        let Some(entry_range) =
            EntryRange::around(breakdown.last_close, self.config.entry_band, precision)
        else {
            warn!("Cannot build entry range for {} from close {}", symbol, breakdown.last_close);
            return None;
        };

        let Some(expires_at) = Duration::try_seconds(self.config.expiry_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
        else {
            warn!(
                "Expiry of {}s is out of range for {}, signal dropped",
                self.config.expiry_secs, symbol
            );
            return None;
        };

        let signal = Signal {
            id: Uuid::new_v4(),
            market: market.to_string(),
            instrument: symbol,
            direction: breakdown.direction,
            entry_range,
            confidence: breakdown.confidence,
            boosted: self.boost.sample(breakdown.confidence),
            notes: breakdown.notes(),
            emitted_at: now,
            expires_at,
        };

        if let Err(e) = self.history.store(&signal).await {
            warn!("Failed to store signal {} in history: {}", signal.id, e);
        }

        debug!(
            "Scored {} -> {} conf {} (raw {})",
            signal.instrument, signal.direction, signal.confidence, breakdown.raw_score
        );
        Some(signal)
    }

    /// Pure scoring over a base series. Does not touch history.
    pub fn evaluate(&self, instrument: &str, bars: &[Bar]) -> Option<ScoreBreakdown> {
        let cfg = &self.config;
        if bars.len() < cfg.min_base_bars {
            debug!(
                "Insufficient data for {}: {} < {} bars",
                instrument,
                bars.len(),
                cfg.min_base_bars
            );
            return None;
        }

        let fast = resample(bars, cfg.fast_stride_secs);
        let slow = resample(bars, cfg.slow_stride_secs);
        let last_fast = *fast.last()?;

        let fast_closes = trailing_closes(&fast, cfg.closes_lookback);
        let slow_closes = trailing_closes(&slow, cfg.closes_lookback);

        let fast_short = self.indicator(instrument, "fast short sma", sma(&fast_closes, cfg.short_period));
        let fast_long = self.indicator(instrument, "fast long sma", sma(&fast_closes, cfg.long_period));
        let oscillator = self.indicator(instrument, "fast rsi", rsi(&fast_closes, cfg.oscillator_period));
        let slow_short = self.indicator(instrument, "slow short sma", sma(&slow_closes, cfg.short_period));
        let slow_long = self.indicator(instrument, "slow long sma", sma(&slow_closes, cfg.long_period));

        let fast_trend = Trend::from_averages(fast_short, fast_long);
        let slow_trend = Trend::from_averages(slow_short, slow_long);
        let spike = volume_spike(bars, cfg.volume_window, cfg.volume_spike_multiplier);
        let upper_wick = last_fast.upper_wick();
        let lower_wick = last_fast.lower_wick();
        let round_price = near_round_price(last_fast.close, cfg.round_tolerance);

        let w = &cfg.weights;
        let mut score = NEUTRAL_SCORE;

        if let Some(trend) = fast_trend {
            score += trend.sign() * w.fast_trend;
        }
        if let Some(trend) = slow_trend {
            score += trend.sign() * w.slow_trend;
        }
        if let Some(value) = oscillator {
            if value < cfg.oversold {
                score += w.oscillator;
            }
            if value > cfg.overbought {
                score -= w.oscillator;
            }
        }
        if spike {
            score += w.volume_spike;
        }
        if lower_wick > upper_wick {
            score += w.wick;
        }
        if upper_wick > lower_wick {
            score -= w.wick;
        }

        let ctx = PatternContext {
            instrument,
            base: bars,
            fast: &fast,
            slow: &slow,
        };
        let mut patterns = Vec::new();
        for detector in &self.patterns {
            if detector.detect(&ctx) {
                score += detector.boost();
                patterns.push(detector.name().to_string());
            }
        }

        if round_price {
            score += w.round_price;
        }

        let confidence = clamp_confidence(score as f64);
        let direction =
            resolve_direction(confidence, fast_trend, cfg.call_threshold, cfg.put_threshold);

        Some(ScoreBreakdown {
            fast_trend,
            slow_trend,
            oscillator,
            volume_spike: spike,
            upper_wick,
            lower_wick,
            patterns,
            round_price,
            last_close: last_fast.close,
            raw_score: score,
            confidence,
            direction,
        })
    }

    fn indicator(&self, instrument: &str, label: &str, result: IndicatorResult) -> Option<f64> {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.indicator_failures.fetch_add(1, Ordering::Relaxed);
                warn!("{} failed for {}, scoring as neutral: {}", label, instrument, e);
                None
            }
        }
    }
}
