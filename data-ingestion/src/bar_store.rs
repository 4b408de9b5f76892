// Bar Store
// Append-only, capacity-bounded base series per instrument

use common::{bucket_start, check_tick_fields, normalize_symbol, Bar, Tick, TickError};
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Base resolution, in seconds
pub const DEFAULT_BASE_STRIDE_SECS: i64 = 1;
/// One hour of 1s bars
pub const DEFAULT_RETENTION: usize = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStoreConfig {
    pub stride_secs: i64,
    pub retention: usize,
}

impl Default for BarStoreConfig {
    fn default() -> Self {
        Self {
            stride_secs: DEFAULT_BASE_STRIDE_SECS,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// What happened to the series when a tick was ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new bucket was opened
    Opened,
    /// The current bar was updated in place
    Updated,
    /// The tick belongs to a bucket older than the last bar and was dropped
    Stale,
}

/// Per-instrument base bars.
///
/// Each series lives behind its map entry lock: writers for one instrument
/// are serialized, and readers get a copy taken under the same lock, so a
/// snapshot never contains a half-applied tick.
pub struct BarStore {
    config: BarStoreConfig,
    series: DashMap<String, VecDeque<Bar>>,
}

impl BarStore {
    pub fn new(config: BarStoreConfig) -> Self {
        Self {
            config: BarStoreConfig {
                stride_secs: config.stride_secs.max(1),
                retention: config.retention.max(1),
            },
            series: DashMap::new(),
        }
    }

    pub fn stride_secs(&self) -> i64 {
        self.config.stride_secs
    }

    pub fn retention(&self) -> usize {
        self.config.retention
    }

    /// Fold one tick into the instrument's base series.
    pub fn ingest(
        &self,
        instrument: &str,
        price: f64,
        size: f64,
        timestamp: i64,
    ) -> Result<IngestOutcome, TickError> {
        check_tick_fields(price, size)?;

        let bucket = bucket_start(timestamp, self.config.stride_secs);
        let mut series = self.series.entry(normalize_symbol(instrument)).or_default();

        let outcome = match series.back().map(|last| last.time) {
            Some(last_time) if last_time == bucket => {
                if let Some(last) = series.back_mut() {
                    last.apply_tick(price, size);
                }
                IngestOutcome::Updated
            }
            Some(last_time) if last_time > bucket => {
                debug!(
                    "Dropping stale tick for {} (bucket {} < {})",
                    instrument, bucket, last_time
                );
                IngestOutcome::Stale
            }
            _ => {
                series.push_back(Bar::seed(bucket, price, size));
                IngestOutcome::Opened
            }
        };

        while series.len() > self.config.retention {
            series.pop_front();
        }

        trace!("{} @ {} -> {:?}", instrument, timestamp, outcome);
        Ok(outcome)
    }

    pub fn ingest_tick(&self, tick: &Tick) -> Result<IngestOutcome, TickError> {
        self.ingest(&tick.instrument, tick.price, tick.size, tick.timestamp)
    }

    /// Copy of the instrument's base series, oldest first.
    pub fn snapshot(&self, instrument: &str) -> Vec<Bar> {
        self.series
            .get(&normalize_symbol(instrument))
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, instrument: &str) -> usize {
        self.series
            .get(&normalize_symbol(instrument))
            .map(|series| series.len())
            .unwrap_or(0)
    }

    pub fn last_bar(&self, instrument: &str) -> Option<Bar> {
        self.series
            .get(&normalize_symbol(instrument))
            .and_then(|series| series.back().copied())
    }

    pub fn instruments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.series.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for BarStore {
    fn default() -> Self {
        Self::new(BarStoreConfig::default())
    }
}
