//! Shared domain types for the tick-to-signal pipeline.
//!
//! Every crate in the workspace speaks in these types:
//! - `Tick` and `Bar` for market data
//! - `InstrumentMeta` / `InstrumentTable` for per-symbol display and feed settings
//! - `Signal` and its wire envelopes for the publish boundary

pub mod error;
pub mod instrument;
pub mod market_data;
pub mod signal;
pub mod wire;

pub use error::TickError;
pub use instrument::{normalize_symbol, InstrumentCategory, InstrumentMeta, InstrumentTable};
pub use market_data::{bucket_start, check_tick_fields, Bar, Tick};
pub use signal::{Direction, EntryRange, Signal};
pub use wire::{ClientRequest, OutboundMessage, PairInfo};

// Re-exports so downstream crates agree on versions
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
