use super::types::ShutdownReason;
use crate::action::{invoker_from_config, ActionInvoker};
use crate::config::GestureKeysConfig;
use crate::debounce::Debouncer;
use crate::engine::GestureEngine;
use crate::error::Result;
use crate::events::{EventBus, EventMetrics, GestureKeysEvent};
use crate::keyboard_input::KeyboardInputHandler;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owns one capture session: the engine, the action invoker and the event bus
pub struct GestureKeysApp {
    pub(super) config: GestureKeysConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) engine: GestureEngine,
    pub(super) invoker: Box<dyn ActionInvoker>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) metrics: EventMetrics,

    // Lifecycle management
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl GestureKeysApp {
    /// Create a new session from a validated configuration
    pub fn new(config: GestureKeysConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let engine = GestureEngine::new(Debouncer::from_config(&config.debounce));
        let invoker = invoker_from_config(&config.action);
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        info!(
            "Session configured: cooldown {:.2}s, action invoker '{}'",
            config.debounce.cooldown_seconds,
            invoker.invoker_name()
        );

        Ok(Self {
            config,
            event_bus,
            engine,
            invoker,
            keyboard_handler: None,
            metrics: EventMetrics::default(),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Replace the configured action invoker
    pub fn with_invoker(mut self, invoker: Box<dyn ActionInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &EventMetrics {
        &self.metrics
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Record and broadcast an event. Having no subscribers is not an error.
    pub(super) async fn publish(&mut self, event: GestureKeysEvent) {
        self.metrics.record_event(&event);
        if let Err(e) = self.event_bus.publish(event).await {
            debug!("Event not delivered: {}", e);
        }
    }
}
