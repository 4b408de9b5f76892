//! Service configuration
//!
//! Defaults, an optional TOML file, then environment overrides. The result is
//! validated once at startup; any problem is fatal before processing begins.

use common::{normalize_symbol, InstrumentCategory, InstrumentMeta, InstrumentTable};
use data_ingestion::BarStoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::emitter::EmitterConfig;
use crate::scoring::{ScoringConfig, MAX_EXPIRY_SECS};

/// Environment variable naming the TOML file
pub const CONFIG_PATH_ENV: &str = "SIGNAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Instruments scored every cycle; the first one is the request default
    #[serde(default = "default_watch_list")]
    pub watch_list: Vec<String>,

    #[serde(default = "default_emit_interval_secs")]
    pub emit_interval_secs: u64,

    /// Base bars kept per instrument
    #[serde(default = "default_retention")]
    pub retention: usize,

    #[serde(default = "default_base_stride_secs")]
    pub base_stride_secs: i64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_market")]
    pub default_market: String,

    /// Generate synthetic ticks for instruments without enough data
    #[serde(default = "default_synthetic_fallback")]
    pub synthetic_fallback: bool,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentMeta>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            watch_list: default_watch_list(),
            emit_interval_secs: default_emit_interval_secs(),
            retention: default_retention(),
            base_stride_secs: default_base_stride_secs(),
            history_capacity: default_history_capacity(),
            default_market: default_market(),
            synthetic_fallback: default_synthetic_fallback(),
            scoring: ScoringConfig::default(),
            instruments: default_instruments(),
        }
    }
}

fn default_watch_list() -> Vec<String> {
    vec!["BTCUSDT".into(), "EURUSD".into(), "USDJPY".into()]
}

fn default_emit_interval_secs() -> u64 {
    5
}

fn default_retention() -> usize {
    3600
}

fn default_base_stride_secs() -> i64 {
    1
}

fn default_history_capacity() -> usize {
    500
}

fn default_market() -> String {
    "binary".to_string()
}

fn default_synthetic_fallback() -> bool {
    true
}

fn default_instruments() -> Vec<InstrumentMeta> {
    vec![
        InstrumentMeta::new("BTCUSDT", InstrumentCategory::Crypto, 0).with_feed(110_000.0, 200.0, 1.0),
        InstrumentMeta::new("EURUSD", InstrumentCategory::Forex, 4).with_feed(1.09, 0.0012, 100.0),
        InstrumentMeta::new("USDJPY", InstrumentCategory::Forex, 4).with_feed(150.0, 0.12, 100.0),
    ]
}

impl ServiceConfig {
    /// Defaults, then the file named by `SIGNAL_CONFIG` if set, then
    /// environment overrides. Validated before returning.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => load_config(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(symbols) = lookup("WATCH_SYMBOLS") {
            self.watch_list = symbols
                .split(',')
                .map(normalize_symbol)
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(value) = lookup("EMIT_INTERVAL_SECS") {
            self.emit_interval_secs = parse_env("EMIT_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("BINARY_EXPIRY_SECONDS") {
            self.scoring.expiry_secs = parse_env("BINARY_EXPIRY_SECONDS", &value)?;
        }
        if let Some(value) = lookup("BAR_RETENTION") {
            self.retention = parse_env("BAR_RETENTION", &value)?;
        }
        if let Some(value) = lookup("HISTORY_CAPACITY") {
            self.history_capacity = parse_env("HISTORY_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("SYNTHETIC_FALLBACK") {
            self.synthetic_fallback = parse_env("SYNTHETIC_FALLBACK", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.watch_list.is_empty() {
            return invalid("watch list is empty".into());
        }
        if self.emit_interval_secs == 0 {
            return invalid("emit interval must be at least 1 second".into());
        }
        if self.retention == 0 {
            return invalid("bar retention must be at least 1".into());
        }
        if self.history_capacity == 0 {
            return invalid("history capacity must be at least 1".into());
        }
        if self.base_stride_secs < 1 {
            return invalid("base stride must be at least 1 second".into());
        }
        if !(1..=MAX_EXPIRY_SECS).contains(&self.scoring.expiry_secs) {
            return invalid(format!(
                "expiry {}s must be between 1 and {} seconds",
                self.scoring.expiry_secs, MAX_EXPIRY_SECS
            ));
        }

        let base = self.base_stride_secs;
        for (name, stride) in [
            ("fast", self.scoring.fast_stride_secs),
            ("slow", self.scoring.slow_stride_secs),
        ] {
            if stride < base || stride % base != 0 {
                return invalid(format!(
                    "{} stride {}s is not a multiple of the {}s base stride",
                    name, stride, base
                ));
            }
        }

        if self.scoring.put_threshold >= self.scoring.call_threshold {
            return invalid(format!(
                "put threshold {} must be below call threshold {}",
                self.scoring.put_threshold, self.scoring.call_threshold
            ));
        }
        Ok(())
    }

    pub fn bar_store_config(&self) -> BarStoreConfig {
        BarStoreConfig {
            stride_secs: self.base_stride_secs,
            retention: self.retention,
        }
    }

    pub fn emitter_config(&self) -> EmitterConfig {
        EmitterConfig {
            watch_list: self.watch_list.clone(),
            interval: Duration::from_secs(self.emit_interval_secs),
            default_market: self.default_market.clone(),
        }
    }

    pub fn instrument_table(&self) -> InstrumentTable {
        InstrumentTable::new(self.instruments.iter().cloned())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<ServiceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    let config: ServiceConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::BoostPolicy;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.watch_list, vec!["BTCUSDT", "EURUSD", "USDJPY"]);
        assert_eq!(config.emit_interval_secs, 5);
        assert_eq!(config.scoring.expiry_secs, 60);
        assert_eq!(config.scoring.min_base_bars, 30);
        assert!(config.validate().is_ok());

        let table = config.instrument_table();
        assert_eq!(table.precision("BTCUSDT"), 0);
        assert_eq!(table.precision("EURUSD"), 4);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
watch_list = ["GBPUSD"]
emit_interval_secs = 2

[scoring]
call_threshold = 70

[scoring.weights]
wick = 3

[scoring.boost_policy]
policy = "min_confidence"
threshold = 75
"#,
        )
        .unwrap();

        assert_eq!(config.watch_list, vec!["GBPUSD"]);
        assert_eq!(config.emit_interval_secs, 2);
        assert_eq!(config.retention, 3600);
        assert_eq!(config.scoring.call_threshold, 70);
        assert_eq!(config.scoring.put_threshold, 40);
        assert_eq!(config.scoring.weights.wick, 3);
        assert_eq!(config.scoring.weights.fast_trend, 8);
        assert_eq!(config.scoring.boost_policy, BoostPolicy::MinConfidence { threshold: 75 });
        assert_eq!(config.instruments.len(), 3);
    }

    #[test]
    fn test_config_serialization() {
        let config = ServiceConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: ServiceConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.watch_list, deserialized.watch_list);
        assert_eq!(config.scoring, deserialized.scoring);
        assert_eq!(config.instruments, deserialized.instruments);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_env_overrides(env(&[
                ("WATCH_SYMBOLS", "eurusd, gbpusd,,"),
                ("EMIT_INTERVAL_SECS", "10"),
                ("BINARY_EXPIRY_SECONDS", "120"),
                ("BAR_RETENTION", "600"),
                ("HISTORY_CAPACITY", "50"),
                ("SYNTHETIC_FALLBACK", "false"),
            ]))
            .unwrap();

        assert_eq!(config.watch_list, vec!["EURUSD", "GBPUSD"]);
        assert_eq!(config.emit_interval_secs, 10);
        assert_eq!(config.scoring.expiry_secs, 120);
        assert_eq!(config.retention, 600);
        assert_eq!(config.history_capacity, 50);
        assert!(!config.synthetic_fallback);
        assert_eq!(config.emitter_config().interval, Duration::from_secs(10));
    }

    #[test]
    fn test_non_numeric_env_is_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env_overrides(env(&[("BINARY_EXPIRY_SECONDS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == "BINARY_EXPIRY_SECONDS"));
    }

    #[test]
    fn test_out_of_range_expiry_is_fatal() {
        let mut config = ServiceConfig::default();
        config
            .apply_env_overrides(env(&[("BINARY_EXPIRY_SECONDS", "9223372036854775807")]))
            .unwrap();
        assert_eq!(config.scoring.expiry_secs, i64::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.scoring.expiry_secs = MAX_EXPIRY_SECS;
        assert!(config.validate().is_ok());
        config.scoring.expiry_secs = MAX_EXPIRY_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_failures() {
        let cases: Vec<Box<dyn Fn(&mut ServiceConfig)>> = vec![
            Box::new(|c| c.watch_list.clear()),
            Box::new(|c| c.emit_interval_secs = 0),
            Box::new(|c| c.retention = 0),
            Box::new(|c| c.history_capacity = 0),
            Box::new(|c| c.base_stride_secs = 7),
            Box::new(|c| {
                c.base_stride_secs = 60;
                c.scoring.slow_stride_secs = 90;
            }),
            Box::new(|c| c.scoring.fast_stride_secs = 0),
            Box::new(|c| c.scoring.put_threshold = 60),
        ];

        for mutate in cases {
            let mut config = ServiceConfig::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/signal.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
