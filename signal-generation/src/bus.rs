// Publish Bus
// Fans outbound messages out to connected subscribers without blocking the emitter

use common::OutboundMessage;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Per-subscriber queue depth
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Receiving half handed to a client connection
pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::Receiver<String>,
}

/// Publish channel for signal and log messages.
///
/// Each subscriber owns a bounded queue. A full queue drops the message for
/// that subscriber only; a closed queue unsubscribes it.
pub struct SignalBus {
    subscribers: DashMap<u64, mpsc::Sender<String>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::with_buffer(SUBSCRIBER_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.insert(id, tx);
        debug!("Subscriber {} connected ({} total)", id, self.subscribers.len());
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            debug!("Subscriber {} removed", id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Serialize once and offer the payload to every subscriber.
    /// Returns the number of subscribers that accepted it.
    pub fn publish(&self, message: &OutboundMessage) -> usize {
        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize outbound message: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            match entry.value().try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("Subscriber {} is lagging, message dropped", entry.key());
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // removal must happen after the iterator releases its shard locks
        for id in closed {
            self.unsubscribe(id);
        }
        delivered
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}
