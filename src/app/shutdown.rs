use super::{GestureKeysApp, SessionSummary, ShutdownReason};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl GestureKeysApp {
    /// Stop background tasks and report the session
    pub(super) async fn shutdown(&mut self, reason: ShutdownReason) -> Result<SessionSummary> {
        info!("Shutdown initiated: {:?}", reason);

        self.cancellation_token.cancel();

        if let Some(handler) = self.keyboard_handler.take() {
            match timeout(Duration::from_secs(2), handler.stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Error stopping keyboard handler: {}", e),
                Err(_) => error!("Keyboard handler stop timeout"),
            }
        }

        let summary = SessionSummary {
            reason,
            frames_processed: self.engine.frames_processed(),
            trigger_count: self.engine.trigger_count(),
            hand_losses: self.metrics.count("hand_lost"),
            invalid_frames: self.metrics.count("source_error"),
            action_failures: self.metrics.count("action_failed"),
        };

        self.metrics.print_summary();
        info!(
            "Session ended: {} frames, {} gestures triggered",
            summary.frames_processed, summary.trigger_count
        );

        Ok(summary)
    }
}
