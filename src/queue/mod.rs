//! Bounded event queue.
//!
//! Ingestion pushes admitted work in; the worker drains it in FIFO order.
//! Backed by a `tokio::sync::mpsc` bounded channel so `take` is async and
//! cooperates with the runtime instead of spinning. Generic over the queued
//! item so ingestion can enqueue a pre-validated access request rather than
//! a fully scored [`crate::types::Event`], which doesn't exist yet at enqueue
//! time.

use tokio::sync::mpsc;

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStats {
    pub current_size: usize,
    pub max_size: usize,
    pub utilization_percent: f64,
    pub is_near_capacity: bool,
}

/// Sending half. Cloned into every ingest handler.
#[derive(Clone)]
pub struct Sender<T> {
    tx: mpsc::Sender<T>,
    capacity: usize,
    near_capacity_ratio: f64,
}

/// Receiving half. Owned by the worker loop alone.
pub struct Receiver<T> {
    rx: mpsc::Receiver<T>,
}

/// Build a bounded queue of the given capacity.
pub fn bounded<T>(capacity: usize, near_capacity_ratio: f64) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Sender {
            tx,
            capacity,
            near_capacity_ratio,
        },
        Receiver { rx },
    )
}

impl<T> Sender<T> {
    /// Current occupied slots, inferred from channel capacity minus the
    /// sender-observed remaining permits.
    pub fn len(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 90%-of-capacity admission cutoff.
    pub fn is_near_capacity(&self) -> bool {
        self.len() as f64 > self.near_capacity_ratio * self.capacity as f64
    }

    pub fn stats(&self) -> QueueStats {
        let current_size = self.len();
        QueueStats {
            current_size,
            max_size: self.capacity,
            utilization_percent: current_size as f64 / self.capacity as f64 * 100.0,
            is_near_capacity: self.is_near_capacity(),
        }
    }

    /// Attempt to admit an item without blocking. Returns `Err(item)` back to
    /// the caller when the channel is full so ingestion can surface a 503.
    pub fn try_offer(&self, item: T) -> Result<(), T> {
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(item) => item,
            mpsc::error::TrySendError::Closed(item) => item,
        })
    }
}

impl<T> Receiver<T> {
    pub async fn take(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}
