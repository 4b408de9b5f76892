// Signal Generation Service
// Scores multi-timeframe bar data into trade signals and fans them out to subscribers

pub mod boost;
pub mod bus;
pub mod config;
pub mod emitter;
pub mod indicators;
pub mod patterns;
pub mod scoring;
pub mod storage;

pub use boost::{BoostPolicy, BoostSampler};
pub use bus::{SignalBus, Subscription};
pub use config::{load_config, ConfigError, ServiceConfig};
pub use emitter::{CycleReport, EmitterConfig, SignalEmitter};
pub use indicators::{ema, rsi, sma, IndicatorError};
pub use patterns::{gap_fill, order_block, FnDetector, PatternContext, PatternDetector};
pub use scoring::{ScoreBreakdown, ScoringConfig, ScoringEngine, ScoringWeights, Trend};
pub use storage::{SignalHistory, SignalStorage, StorageStats};
