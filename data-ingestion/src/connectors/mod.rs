//! Tick-source boundary
//!
//! Live feeds call `BarStore::ingest` directly. The emitter only talks to a
//! `TickSource` when an instrument is below its minimum bar count and needs
//! topping up.

pub mod synthetic;

pub use synthetic::SyntheticTickSource;

use crate::bar_store::BarStore;
use anyhow::Result;

pub trait TickSource: Send + Sync {
    fn name(&self) -> &str;

    /// Push fresh ticks for `instrument` at `now_secs` into the store.
    fn top_up(&self, instrument: &str, store: &BarStore, now_secs: i64) -> Result<()>;
}
