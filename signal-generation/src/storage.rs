// Signal History
// Bounded, newest-first record of emitted signals for replay and backtest queries

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{normalize_symbol, Direction, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Trait for signal storage backends
#[async_trait::async_trait]
pub trait SignalStorage: Send + Sync {
    /// Store a signal as the newest entry
    async fn store(&self, signal: &Signal) -> Result<()>;

    /// Retrieve a signal by ID
    async fn get(&self, signal_id: Uuid) -> Result<Option<Signal>>;

    /// Most recent signals, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<Signal>>;

    /// Most recent signals for one instrument, newest first
    async fn by_instrument(&self, instrument: &str, limit: usize) -> Result<Vec<Signal>>;

    /// Get storage statistics
    async fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_signals: usize,
    pub capacity: usize,
    pub signals_by_direction: HashMap<Direction, usize>,
    pub oldest_signal: Option<DateTime<Utc>>,
    pub newest_signal: Option<DateTime<Utc>>,
}

/// In-memory history; the oldest entry is dropped once capacity is reached.
pub struct SignalHistory {
    capacity: usize,
    signals: tokio::sync::RwLock<VecDeque<Signal>>,
}

impl SignalHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            signals: tokio::sync::RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.signals.read().await.len()
    }
}

impl Default for SignalHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait::async_trait]
impl SignalStorage for SignalHistory {
    async fn store(&self, signal: &Signal) -> Result<()> {
        let mut signals = self.signals.write().await;
        signals.push_front(signal.clone());
        signals.truncate(self.capacity);
        Ok(())
    }

    async fn get(&self, signal_id: Uuid) -> Result<Option<Signal>> {
        let signals = self.signals.read().await;
        Ok(signals.iter().find(|s| s.id == signal_id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Signal>> {
        let signals = self.signals.read().await;
        Ok(signals.iter().take(limit).cloned().collect())
    }

    async fn by_instrument(&self, instrument: &str, limit: usize) -> Result<Vec<Signal>> {
        let symbol = normalize_symbol(instrument);
        let signals = self.signals.read().await;
        Ok(signals
            .iter()
            .filter(|s| s.instrument == symbol)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<StorageStats> {
        let signals = self.signals.read().await;

        let mut signals_by_direction = HashMap::new();
        for signal in signals.iter() {
            *signals_by_direction.entry(signal.direction).or_insert(0) += 1;
        }

        Ok(StorageStats {
            total_signals: signals.len(),
            capacity: self.capacity,
            signals_by_direction,
            oldest_signal: signals.back().map(|s| s.emitted_at),
            newest_signal: signals.front().map(|s| s.emitted_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::EntryRange;

    fn signal(instrument: &str, seq: i64, direction: Direction) -> Signal {
        let emitted_at = DateTime::<Utc>::from_timestamp(1_700_000_000 + seq, 0).unwrap();
        Signal {
            id: Uuid::new_v4(),
            market: "binary".to_string(),
            instrument: instrument.to_string(),
            direction,
            entry_range: EntryRange::around(100.0, 0.001, 2).unwrap(),
            confidence: 55,
            boosted: false,
            notes: format!("seq {}", seq),
            emitted_at,
            expires_at: emitted_at + Duration::seconds(60),
        }
    }

    #[tokio::test]
    async fn test_capacity_bound_and_newest_first() {
        let history = SignalHistory::new(3);

        for seq in 0..10 {
            history.store(&signal("EURUSD", seq, Direction::Call)).await.unwrap();
            assert!(history.len().await <= 3);
        }

        let recent = history.recent(10).await.unwrap();
        let notes: Vec<&str> = recent.iter().map(|s| s.notes.as_str()).collect();
        assert_eq!(notes, vec!["seq 9", "seq 8", "seq 7"]);
    }

    #[tokio::test]
    async fn test_recent_limit_and_lookup() {
        let history = SignalHistory::default();
        let first = signal("EURUSD", 0, Direction::Call);
        history.store(&first).await.unwrap();
        history.store(&signal("BTCUSDT", 1, Direction::Put)).await.unwrap();

        assert_eq!(history.recent(1).await.unwrap()[0].instrument, "BTCUSDT");
        assert_eq!(history.get(first.id).await.unwrap(), Some(first));
        assert!(history.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_by_instrument() {
        let history = SignalHistory::new(10);
        for seq in 0..6 {
            let instrument = if seq % 2 == 0 { "EURUSD" } else { "BTCUSDT" };
            history.store(&signal(instrument, seq, Direction::Call)).await.unwrap();
        }

        let eur = history.by_instrument("eurusd", 2).await.unwrap();
        assert_eq!(eur.len(), 2);
        assert_eq!(eur[0].notes, "seq 4");
        assert_eq!(eur[1].notes, "seq 2");
    }

    #[tokio::test]
    async fn test_stats() {
        let history = SignalHistory::new(10);
        history.store(&signal("EURUSD", 0, Direction::Call)).await.unwrap();
        history.store(&signal("EURUSD", 1, Direction::Put)).await.unwrap();
        history.store(&signal("EURUSD", 2, Direction::Put)).await.unwrap();

        let stats = history.stats().await.unwrap();
        assert_eq!(stats.total_signals, 3);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.signals_by_direction.get(&Direction::Put), Some(&2));
        assert!(stats.oldest_signal < stats.newest_signal);
    }
}
