// Trade signal model
// Built by the scoring engine, immutable once emitted

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Directional call carried by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Call => write!(f, "CALL"),
            Direction::Put => write!(f, "PUT"),
        }
    }
}

/// Suggested entry band around the last close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRange {
    pub low: Decimal,
    pub high: Decimal,
}

impl EntryRange {
    /// `price * (1 - band) .. price * (1 + band)` rounded half away from zero
    /// to `precision` decimal places. `None` when the price is not finite.
    pub fn around(price: f64, band: f64, precision: u32) -> Option<Self> {
        let round = |value: f64| {
            Decimal::from_f64(value).map(|d| {
                d.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
            })
        };

        Some(Self {
            low: round(price * (1.0 - band))?,
            high: round(price * (1.0 + band))?,
        })
    }
}

impl fmt::Display for EntryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.low, self.high)
    }
}

/// Trade signal as published to clients and kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub market: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_range: EntryRange,
    pub confidence: u8, // 10 to 99
    pub boosted: bool,
    pub notes: String,
    pub emitted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Signal {
    /// One-line summary published alongside the signal
    pub fn log_line(&self) -> String {
        format!(
            "Signal {} {} conf:{}",
            self.instrument, self.direction, self.confidence
        )
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_signal() -> Signal {
        let now = Utc::now();
        Signal {
            id: Uuid::new_v4(),
            market: "binary".to_string(),
            instrument: "EURUSD".to_string(),
            direction: Direction::Put,
            entry_range: EntryRange::around(1.09, 0.001, 4).unwrap(),
            confidence: 42,
            boosted: false,
            notes: "test".to_string(),
            emitted_at: now,
            expires_at: now + Duration::seconds(60),
        }
    }

    #[test]
    fn test_entry_range_precision() {
        let range = EntryRange::around(1.09, 0.001, 4).unwrap();
        assert_eq!(range.low.to_string(), "1.0889");
        assert_eq!(range.high.to_string(), "1.0911");

        let range = EntryRange::around(110_000.0, 0.001, 0).unwrap();
        assert_eq!(range.low, Decimal::from(109_890));
        assert_eq!(range.high, Decimal::from(110_110));
        assert_eq!(range.to_string(), "109890 – 110110");
    }

    #[test]
    fn test_entry_range_rejects_non_finite() {
        assert!(EntryRange::around(f64::NAN, 0.001, 4).is_none());
    }

    #[test]
    fn test_log_line() {
        let signal = sample_signal();
        assert_eq!(signal.log_line(), "Signal EURUSD PUT conf:42");
    }

    #[test]
    fn test_direction_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Direction::Call).unwrap(), "\"CALL\"");
        assert_eq!(serde_json::to_string(&Direction::Put).unwrap(), "\"PUT\"");
    }

    #[test]
    fn test_expiry() {
        let signal = sample_signal();
        assert!(!signal.is_expired(signal.emitted_at));
        assert!(signal.is_expired(signal.expires_at));
    }
}
