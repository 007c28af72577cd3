use super::{GestureKeysApp, SessionSummary, ShutdownReason};
use crate::error::{GestureKeysError, Result};
use crate::events::{EventReceiver, GestureKeysEvent};
use crate::keyboard_input::KeyboardInputHandler;
use crate::source::{open_source, spawn_frame_reader, FrameInput, HandFrame, StreamClock};
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

impl GestureKeysApp {
    /// Run a session over the configured landmark stream until it ends or a
    /// shutdown is requested
    pub async fn run(&mut self) -> Result<SessionSummary> {
        info!("gesture-keys is running");

        let reader = open_source(&self.config.source)?;

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| GestureKeysError::system("Shutdown sender already taken"))?;
        self.setup_signal_handlers(shutdown_sender);

        // Raw mode would swallow the landmark stream when it arrives on stdin
        if self.config.system.keyboard_quit
            && !self.config.source.is_stdin()
            && std::io::stdin().is_terminal()
        {
            let handler = KeyboardInputHandler::new(Arc::clone(&self.event_bus));
            handler.start().await?;
            self.keyboard_handler = Some(handler);
        }

        self.run_with_reader(reader).await
    }

    /// Run a session over an already opened JSON-lines stream
    pub async fn run_with_reader<R>(&mut self, reader: R) -> Result<SessionSummary>
    where
        R: BufRead + Send + 'static,
    {
        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| GestureKeysError::system("Shutdown receiver already taken"))?;

        let clock = StreamClock::new(Instant::now());
        let (frames, reader_task) = spawn_frame_reader(
            reader,
            self.config.source.channel_capacity,
            self.cancellation_token.child_token(),
        );

        let mut reason = self.process_frames(frames, clock, shutdown_receiver).await;

        // The reader is only awaited once it has finished; a reader blocked on
        // stdin is left behind on shutdown.
        if reason == ShutdownReason::SourceEnded {
            reason = match reader_task.await {
                Ok(Ok(frames)) => {
                    self.publish(GestureKeysEvent::SourceEnded { frames }).await;
                    ShutdownReason::SourceEnded
                }
                Ok(Err(e)) => ShutdownReason::SourceFailed(e.to_string()),
                Err(e) => ShutdownReason::SourceFailed(format!("Frame reader task failed: {}", e)),
            };
        }

        self.shutdown(reason).await
    }

    /// The frame loop: one frame at a time, in arrival order.
    ///
    /// Actions are awaited inline, so a slow invoker (up to `action.timeout_ms`)
    /// delays shutdown handling and lets frames queue in the channel. Frame
    /// times are taken on arrival by the reader, so queued frames keep their
    /// place on the session timeline.
    async fn process_frames(
        &mut self,
        mut frames: mpsc::Receiver<HandFrame>,
        mut clock: StreamClock,
        mut shutdown_receiver: oneshot::Receiver<ShutdownReason>,
    ) -> ShutdownReason {
        let cancel = self.cancellation_token.clone();
        let mut shutdown_events = EventReceiver::new(
            self.event_bus.subscribe(),
            vec!["shutdown_requested"],
            "frame_loop".to_string(),
        );

        let status_seconds = self.config.system.status_interval_seconds;
        let mut status_interval = tokio::time::interval(Duration::from_secs(status_seconds.max(1)));
        status_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        status_interval.tick().await;

        let mut signals_open = true;
        let mut now = Duration::ZERO;

        loop {
            tokio::select! {
                biased;

                result = &mut shutdown_receiver, if signals_open => match result {
                    Ok(reason) => return reason,
                    Err(_) => signals_open = false,
                },
                event = shutdown_events.recv() => match event {
                    Ok(GestureKeysEvent::ShutdownRequested { .. }) => return ShutdownReason::UserRequest,
                    Ok(_) => {}
                    Err(e) => debug!("Shutdown listener: {}", e),
                },
                _ = cancel.cancelled() => {
                    return ShutdownReason::Signal("cancelled".to_string());
                }
                _ = status_interval.tick(), if status_seconds > 0 => {
                    info!("{}", self.engine.snapshot(now));
                }
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        now = clock.timestamp(&frame);
                        self.handle_frame(frame, now).await;
                    }
                    None => return ShutdownReason::SourceEnded,
                },
            }
        }
    }

    async fn handle_frame(&mut self, frame: HandFrame, now: Duration) {
        if let FrameInput::Unparseable(error) = &frame.input {
            self.publish(GestureKeysEvent::SourceError {
                line: frame.line,
                error: error.clone(),
            })
            .await;
        }

        let outcome = self.engine.process(frame.points(), now);

        if let Some(error) = &outcome.invalid {
            self.publish(GestureKeysEvent::SourceError {
                line: frame.line,
                error: error.to_string(),
            })
            .await;
        }

        if outcome.hand_lost {
            self.publish(GestureKeysEvent::HandLost { at: now }).await;
        }

        if outcome.label_changed {
            self.publish(GestureKeysEvent::GestureChanged {
                label: outcome.label,
                at: now,
            })
            .await;
        }

        if let Some(trigger) = outcome.trigger {
            self.publish(GestureKeysEvent::TriggerFired {
                label: trigger.label,
                action_id: trigger.action_id.to_string(),
                emitted_at: trigger.emitted_at,
                trigger_count: self.engine.trigger_count(),
            })
            .await;
            info!("{}", self.engine.snapshot(now));

            if let Err(e) = self.invoker.invoke(&trigger).await {
                self.publish(GestureKeysEvent::ActionFailed {
                    action_id: trigger.action_id.to_string(),
                    error: e.to_string(),
                })
                .await;
            }
        }
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
