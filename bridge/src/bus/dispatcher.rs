//! Update signal dispatch

use tokio::sync::broadcast;

/// Zero-payload pulse sent after every successful update cycle.
///
/// Subscribers re-read shared state when they receive it; the signal itself
/// carries nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSignal;

/// Broadcast bus for update signals
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: broadcast::Sender<UpdateSignal>,
}

impl Dispatcher {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to update signals
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateSignal> {
        self.tx.subscribe()
    }

    /// Broadcast the update signal, returning the subscriber count reached
    pub fn send(&self) -> usize {
        match self.tx.send(UpdateSignal) {
            Ok(delivered) => delivered,
            // No live subscribers, nothing to notify
            Err(broadcast::error::SendError(_)) => 0,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(16)
    }
}
