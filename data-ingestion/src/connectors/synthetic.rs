use anyhow::{Context, Result};
use common::{InstrumentTable, Tick};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::TickSource;
use crate::bar_store::BarStore;

/// Demo feed used when no live connector is attached.
///
/// Each call produces one tick around the instrument's reference price:
/// `price = reference + (u - 0.5) * noise`, rounded to the table precision,
/// and `size = u * max_tick_size`.
pub struct SyntheticTickSource {
    instruments: Arc<InstrumentTable>,
    rng: Mutex<fastrand::Rng>,
}

impl SyntheticTickSource {
    pub fn new(instruments: Arc<InstrumentTable>) -> Self {
        Self {
            instruments,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Deterministic variant for tests and replays
    pub fn with_seed(instruments: Arc<InstrumentTable>, seed: u64) -> Self {
        Self {
            instruments,
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// Draw the next tick for `instrument` without touching any store.
    pub fn next_tick(&self, instrument: &str, now_secs: i64) -> Tick {
        let meta = self.instruments.resolve(instrument);
        let (u_price, u_size) = match self.rng.lock() {
            Ok(mut rng) => (rng.f64(), rng.f64()),
            // a poisoned lock only means another thread panicked mid-draw
            Err(poisoned) => {
                let mut rng = poisoned.into_inner();
                (rng.f64(), rng.f64())
            }
        };

        let raw = meta.reference_price() + (u_price - 0.5) * meta.tick_noise();
        let scale = 10f64.powi(meta.precision as i32);
        let mut price = (raw * scale).round() / scale;
        if price <= 0.0 {
            price = 1.0 / scale;
        }

        let size = u_size * meta.max_tick_size();
        Tick::new(meta.symbol, price, size, now_secs)
    }
}

impl TickSource for SyntheticTickSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn top_up(&self, instrument: &str, store: &BarStore, now_secs: i64) -> Result<()> {
        let tick = self.next_tick(instrument, now_secs);
        let outcome = store
            .ingest_tick(&tick)
            .with_context(|| format!("synthetic tick rejected for {}", tick.instrument))?;
        debug!(
            "Synthetic tick {} {} x {:.4} -> {:?}",
            tick.instrument, tick.price, tick.size, outcome
        );
        Ok(())
    }
}
