//! Event emission system for real-time communication with the dashboard
//!
//! The aggregators publish [`EngineEvent`]s on a tokio broadcast channel;
//! the presentation layer (or a test) subscribes and forwards them to the
//! frontend. Emission is toggleable so bulk back-fills can run silently.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::domain::events::{EngineEvent, MetricsEvent, ProbeEvent};
use crate::infrastructure::config::defaults;

/// Event emitter for sending real-time updates to subscribers.
#[derive(Clone)]
pub struct ProbeEventEmitter {
    sender: broadcast::Sender<EngineEvent>,
    /// Whether event emission is enabled
    enabled: Arc<RwLock<bool>>,
}

impl ProbeEventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            enabled: Arc::new(RwLock::new(true)),
        }
    }

    /// Subscribe to the event stream. Slow subscribers that fall more than
    /// the channel capacity behind see `RecvError::Lagged`, never a stalled
    /// aggregator.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Enable or disable event emission.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut guard = self.enabled.write().await;
        *guard = enabled;
        debug!("Event emission {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Check if event emission is enabled.
    pub async fn is_enabled(&self) -> bool {
        *self.enabled.read().await
    }

    /// Emit an engine event to all subscribers. A send error only means
    /// nobody is subscribed, which is fine.
    pub async fn emit(&self, event: EngineEvent) {
        if !self.is_enabled().await {
            return;
        }
        let event_name = event.event_name();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!("Emitted event '{}' to {} subscriber(s)", event_name, receivers);
            }
            Err(_) => {
                debug!("No subscribers for event '{}'", event_name);
            }
        }
    }

    pub async fn emit_probe(&self, event: ProbeEvent) {
        self.emit(EngineEvent::Probe(event)).await;
    }

    pub async fn emit_metrics(&self, event: MetricsEvent) {
        self.emit(EngineEvent::Metrics(event)).await;
    }
}

impl Default for ProbeEventEmitter {
    fn default() -> Self {
        Self::new(defaults::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validity::ValidityRecord;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let emitter = ProbeEventEmitter::new(8);
        let mut receiver = emitter.subscribe();

        emitter
            .emit_probe(ProbeEvent::Record(ValidityRecord::ok("mugs")))
            .await;

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_name(), "probe-record");
    }

    #[tokio::test]
    async fn disabled_emitter_drops_events() {
        let emitter = ProbeEventEmitter::new(8);
        let mut receiver = emitter.subscribe();

        emitter.set_enabled(false).await;
        emitter
            .emit_probe(ProbeEvent::Record(ValidityRecord::ok("mugs")))
            .await;
        emitter.set_enabled(true).await;
        emitter
            .emit_probe(ProbeEvent::Record(ValidityRecord::ok("pens")))
            .await;

        // Only the second event made it onto the channel.
        let event = receiver.recv().await.unwrap();
        match event {
            EngineEvent::Probe(ProbeEvent::Record(record)) => assert_eq!(record.slug, "pens"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn emitting_without_subscribers_does_not_fail() {
        let emitter = ProbeEventEmitter::new(8);
        emitter
            .emit_probe(ProbeEvent::Record(ValidityRecord::ok("mugs")))
            .await;
    }
}
