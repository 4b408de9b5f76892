//! Tick ingestion layer
//!
//! Folds raw ticks into per-instrument base bars and derives coarser
//! resolutions from them on demand.
//! - `BarStore`: bounded per-instrument base series
//! - `resample`: pure multi-resolution fold
//! - `connectors`: the tick-source boundary and the synthetic fallback feed

pub mod bar_store;
pub mod connectors;
pub mod resample;

pub use bar_store::{BarStore, BarStoreConfig, IngestOutcome};
pub use connectors::{SyntheticTickSource, TickSource};
pub use resample::resample;
