//! Instrument metadata table
//!
//! Display precision and synthetic-feed parameters are looked up per symbol
//! instead of being inferred from the symbol's spelling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Precision used for any symbol missing from the table
pub const FALLBACK_PRECISION: u32 = 4;

/// Canonical form of a symbol: trimmed and uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentCategory {
    Crypto,
    Forex,
    Otc,
}

impl InstrumentCategory {
    /// Anchor price for synthetic ticks when the table entry has none
    pub fn default_reference_price(&self) -> f64 {
        match self {
            InstrumentCategory::Crypto => 100.0,
            InstrumentCategory::Forex => 1.0,
            InstrumentCategory::Otc => 1.0,
        }
    }

    /// Tick noise as a fraction of the reference price
    pub fn default_noise_ratio(&self) -> f64 {
        match self {
            InstrumentCategory::Crypto => 0.002,
            InstrumentCategory::Forex | InstrumentCategory::Otc => 0.0012,
        }
    }

    pub fn default_max_tick_size(&self) -> f64 {
        match self {
            InstrumentCategory::Crypto => 1.0,
            InstrumentCategory::Forex | InstrumentCategory::Otc => 100.0,
        }
    }
}

/// One row of the instrument table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMeta {
    pub symbol: String,
    pub category: InstrumentCategory,

    /// Decimal places used when formatting prices (entry range, synthetic ticks)
    #[serde(default = "default_precision")]
    pub precision: u32,

    /// Synthetic feed anchor price
    #[serde(default)]
    pub reference_price: Option<f64>,

    /// Peak-to-peak noise of synthetic ticks, in price units
    #[serde(default)]
    pub tick_noise: Option<f64>,

    /// Upper bound of synthetic tick sizes
    #[serde(default)]
    pub max_tick_size: Option<f64>,
}

fn default_precision() -> u32 {
    FALLBACK_PRECISION
}

impl InstrumentMeta {
    pub fn new(symbol: &str, category: InstrumentCategory, precision: u32) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            category,
            precision,
            reference_price: None,
            tick_noise: None,
            max_tick_size: None,
        }
    }

    /// Entry used for symbols nobody configured
    pub fn fallback(symbol: &str) -> Self {
        Self::new(symbol, InstrumentCategory::Otc, FALLBACK_PRECISION)
    }

    pub fn with_feed(mut self, reference_price: f64, tick_noise: f64, max_tick_size: f64) -> Self {
        self.reference_price = Some(reference_price);
        self.tick_noise = Some(tick_noise);
        self.max_tick_size = Some(max_tick_size);
        self
    }

    pub fn reference_price(&self) -> f64 {
        self.reference_price
            .unwrap_or_else(|| self.category.default_reference_price())
    }

    pub fn tick_noise(&self) -> f64 {
        self.tick_noise
            .unwrap_or_else(|| self.reference_price() * self.category.default_noise_ratio())
    }

    pub fn max_tick_size(&self) -> f64 {
        self.max_tick_size
            .unwrap_or_else(|| self.category.default_max_tick_size())
    }
}

/// Symbol-keyed lookup over `InstrumentMeta` rows.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    entries: HashMap<String, InstrumentMeta>,
}

impl InstrumentTable {
    pub fn new(rows: impl IntoIterator<Item = InstrumentMeta>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.insert(row);
        }
        table
    }

    pub fn insert(&mut self, mut meta: InstrumentMeta) {
        meta.symbol = normalize_symbol(&meta.symbol);
        self.entries.insert(meta.symbol.clone(), meta);
    }

    pub fn get(&self, symbol: &str) -> Option<&InstrumentMeta> {
        self.entries.get(&normalize_symbol(symbol))
    }

    /// Configured row, or the OTC fallback for unknown symbols.
    pub fn resolve(&self, symbol: &str) -> InstrumentMeta {
        self.get(symbol)
            .cloned()
            .unwrap_or_else(|| InstrumentMeta::fallback(symbol))
    }

    pub fn precision(&self, symbol: &str) -> u32 {
        self.get(symbol)
            .map(|m| m.precision)
            .unwrap_or(FALLBACK_PRECISION)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
