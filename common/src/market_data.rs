// Market data primitives
// Ticks are transient; bars are the unit every downstream component reads

use serde::{Deserialize, Serialize};

use crate::error::TickError;

/// A single trade print for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    pub price: f64,
    pub size: f64,
    /// Unix seconds
    pub timestamp: i64,
}

impl Tick {
    pub fn new(instrument: impl Into<String>, price: f64, size: f64, timestamp: i64) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            size,
            timestamp,
        }
    }

    /// Check price and size before they are folded into a bar.
    pub fn validate(&self) -> Result<(), TickError> {
        check_tick_fields(self.price, self.size)
    }
}

/// Shared price/size checks, usable without building a `Tick`.
pub fn check_tick_fields(price: f64, size: f64) -> Result<(), TickError> {
    if !price.is_finite() {
        return Err(TickError::NonFinitePrice(price));
    }
    if !size.is_finite() {
        return Err(TickError::NonFiniteSize(size));
    }
    if price <= 0.0 {
        return Err(TickError::NonPositivePrice(price));
    }
    if size < 0.0 {
        return Err(TickError::NegativeSize(size));
    }
    Ok(())
}

/// Start of the bucket containing `timestamp` for a given stride.
///
/// Uses Euclidean division so timestamps before the epoch still floor.
pub fn bucket_start(timestamp: i64, stride_secs: i64) -> i64 {
    if stride_secs <= 1 {
        return timestamp;
    }
    timestamp.div_euclid(stride_secs) * stride_secs
}

/// OHLCV bar keyed by the start of its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// A fresh bar opened by the first tick of its bucket.
    pub fn seed(time: i64, price: f64, volume: f64) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// Fold a tick from the same bucket into this bar.
    pub fn apply_tick(&mut self, price: f64, size: f64) {
        self.close = price;
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.volume += size;
    }

    /// Fold a later bar of the same target bucket into this one.
    pub fn absorb(&mut self, later: &Bar) {
        self.high = self.high.max(later.high);
        self.low = self.low.min(later.low);
        self.close = later.close;
        self.volume += later.volume;
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.body_high()
    }

    pub fn lower_wick(&self) -> f64 {
        self.body_low() - self.low
    }

    /// `low <= min(open, close) <= max(open, close) <= high` and non-negative volume
    pub fn is_consistent(&self) -> bool {
        self.low <= self.body_low() && self.body_high() <= self.high && self.volume >= 0.0
    }
}
