use crate::error::EventBusError;
use crate::gesture::GestureLabel;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events published by the gesture session. Session offsets are measured
/// from the session epoch.
#[derive(Debug, Clone, Serialize)]
pub enum GestureKeysEvent {
    /// The per-frame classification changed
    GestureChanged { label: GestureLabel, at: Duration },
    /// The debouncer emitted a trigger
    TriggerFired {
        label: GestureLabel,
        action_id: String,
        emitted_at: Duration,
        trigger_count: u64,
    },
    /// The tracked hand left the frame
    HandLost { at: Duration },
    /// The action invoker could not deliver a trigger
    ActionFailed { action_id: String, error: String },
    /// A frame of the landmark stream could not be used
    SourceError { line: u64, error: String },
    /// The landmark stream reached its end
    SourceEnded { frames: u64 },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl GestureKeysEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            GestureKeysEvent::GestureChanged { label, at } => {
                format!("Gesture {} at {:.3}s", label, at.as_secs_f64())
            }
            GestureKeysEvent::TriggerFired {
                label,
                action_id,
                trigger_count,
                ..
            } => {
                format!("Triggered {} for {} (#{})", action_id, label, trigger_count)
            }
            GestureKeysEvent::HandLost { at } => {
                format!("Hand lost at {:.3}s", at.as_secs_f64())
            }
            GestureKeysEvent::ActionFailed { action_id, error } => {
                format!("Action {} failed: {}", action_id, error)
            }
            GestureKeysEvent::SourceError { line, error } => {
                format!("Landmark stream line {}: {}", line, error)
            }
            GestureKeysEvent::SourceEnded { frames } => {
                format!("Landmark stream ended after {} frames", frames)
            }
            GestureKeysEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            GestureKeysEvent::GestureChanged { .. } => "gesture_changed",
            GestureKeysEvent::TriggerFired { .. } => "trigger_fired",
            GestureKeysEvent::HandLost { .. } => "hand_lost",
            GestureKeysEvent::ActionFailed { .. } => "action_failed",
            GestureKeysEvent::SourceError { .. } => "source_error",
            GestureKeysEvent::SourceEnded { .. } => "source_ended",
            GestureKeysEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<GestureKeysEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<GestureKeysEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: GestureKeysEvent) -> Result<usize, EventBusError> {
        debug!("Publishing event: {}", event.description());

        match &event {
            GestureKeysEvent::ActionFailed { action_id, error } => {
                error!("Action {} failed: {}", action_id, error);
            }
            GestureKeysEvent::SourceError { line, error } => {
                warn!("Landmark stream line {}: {}", line, error);
            }
            GestureKeysEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {}
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }
}

/// Event receiver that only yields the listed event types
pub struct EventReceiver {
    receiver: broadcast::Receiver<GestureKeysEvent>,
    event_types: Vec<&'static str>,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<GestureKeysEvent>,
        event_types: Vec<&'static str>,
        name: String,
    ) -> Self {
        Self {
            receiver,
            event_types,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<GestureKeysEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.event_types.contains(&event.event_type()) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

/// Per-session event counters
#[derive(Debug, Default, Clone)]
pub struct EventMetrics {
    pub total_events: u64,
    pub events_by_type: HashMap<&'static str, u64>,
    pub errors: u64,
}

impl EventMetrics {
    pub fn record_event(&mut self, event: &GestureKeysEvent) {
        self.total_events += 1;
        *self.events_by_type.entry(event.event_type()).or_insert(0) += 1;
        if matches!(
            event,
            GestureKeysEvent::ActionFailed { .. } | GestureKeysEvent::SourceError { .. }
        ) {
            self.errors += 1;
        }
    }

    pub fn count(&self, event_type: &str) -> u64 {
        self.events_by_type.get(event_type).copied().unwrap_or(0)
    }

    pub fn print_summary(&self) {
        info!("Event summary:");
        info!("  Total events: {}", self.total_events);
        info!("  Errors: {}", self.errors);

        let mut types: Vec<_> = self.events_by_type.iter().collect();
        types.sort();
        for (event_type, count) in types {
            info!("  {}: {}", event_type, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration as TokioDuration};

    fn trigger(count: u64) -> GestureKeysEvent {
        GestureKeysEvent::TriggerFired {
            label: GestureLabel::ThumbsUp,
            action_id: "option+a".to_string(),
            emitted_at: Duration::from_millis(400),
            trigger_count: count,
        }
    }

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let subscriber_count = event_bus.publish(trigger(1)).await.unwrap();
        assert_eq!(subscriber_count, 1);

        match receiver.recv().await.unwrap() {
            GestureKeysEvent::TriggerFired {
                action_id,
                trigger_count,
                ..
            } => {
                assert_eq!(action_id, "option+a");
                assert_eq!(trigger_count, 1);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_fails() {
        let event_bus = EventBus::new(10);
        assert!(event_bus.publish(trigger(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        let delivered = event_bus
            .publish(GestureKeysEvent::HandLost {
                at: Duration::from_secs(1),
            })
            .await
            .unwrap();
        assert_eq!(delivered, 2);

        let _ = timeout(TokioDuration::from_millis(100), receiver1.recv())
            .await
            .unwrap()
            .unwrap();
        let _ = timeout(TokioDuration::from_millis(100), receiver2.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_filtered_receiver() {
        let event_bus = EventBus::new(10);
        let mut filtered =
            EventReceiver::new(event_bus.subscribe(), vec!["trigger_fired"], "test".to_string());

        event_bus
            .publish(GestureKeysEvent::GestureChanged {
                label: GestureLabel::OneFinger,
                at: Duration::ZERO,
            })
            .await
            .unwrap();
        event_bus.publish(trigger(7)).await.unwrap();

        let received = timeout(TokioDuration::from_millis(100), filtered.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            received,
            GestureKeysEvent::TriggerFired {
                trigger_count: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_event_properties() {
        let event = trigger(3);
        assert_eq!(event.event_type(), "trigger_fired");
        assert_eq!(event.description(), "Triggered option+a for THUMBS_UP (#3)");
    }

    #[test]
    fn test_event_metrics() {
        let mut metrics = EventMetrics::default();
        metrics.record_event(&trigger(1));
        metrics.record_event(&trigger(2));
        metrics.record_event(&GestureKeysEvent::ActionFailed {
            action_id: "option+a".to_string(),
            error: "permission denied".to_string(),
        });

        assert_eq!(metrics.total_events, 3);
        assert_eq!(metrics.count("trigger_fired"), 2);
        assert_eq!(metrics.count("hand_lost"), 0);
        assert_eq!(metrics.errors, 1);
    }
}
