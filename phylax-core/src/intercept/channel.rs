//! Process-wide exception subscription channel

use tokio::sync::broadcast;

use crate::config::ChannelConfig;
use crate::exception::Caught;

/// Fan-out channel for exceptions handled by `handle_only` policies.
///
/// Emission is fire-and-forget: an exception emitted with no live
/// subscribers is dropped, never an error. Consumers subscribe
/// independently and each receives every emission.
#[derive(Debug, Clone)]
pub struct ExceptionChannel {
    tx: broadcast::Sender<Caught>,
}

impl ExceptionChannel {
    /// Create a channel buffering up to `capacity` undelivered exceptions
    /// per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a channel from configuration.
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Emit a handled exception to all current subscribers.
    pub fn emit(&self, caught: Caught) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(caught);
    }

    /// Subscribe to handled exceptions emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Caught> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ExceptionChannel {
    fn default() -> Self {
        Self::from_config(&ChannelConfig::default())
    }
}
