//! Cooldown-gated edge detector turning a per-frame label stream into
//! rate-limited trigger events.
//!
//! The cooldown gate and the edge detector are evaluated together: while the
//! cooldown is running nothing changes, not even an `Unknown` label clearing
//! the edge. Only losing the hand clears the edge unconditionally.

use crate::config::DebounceConfig;
use crate::gesture::GestureLabel;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Mutable state owned by a [`Debouncer`] for one capture session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebounceState {
    pub last_emitted_label: GestureLabel,
    /// `None` until the first emission
    pub last_emission_time: Option<Duration>,
    pub trigger_count: u64,
}

/// An emitted trigger, consumed immediately by the action invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub action_id: &'static str,
    pub label: GestureLabel,
    /// Offset from the session epoch
    pub emitted_at: Duration,
}

/// Logical debouncer state at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebouncePhase {
    /// Cooldown elapsed and no gesture is armed
    Idle,
    /// Inside the cooldown window of the last emission
    Cooldown,
    /// Cooldown elapsed with a gesture still latched
    Ready,
}

/// Read-only view for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebounceSnapshot {
    pub trigger_count: u64,
    pub cooldown_remaining: Duration,
    pub last_emitted_label: GestureLabel,
    pub phase: DebouncePhase,
}

impl fmt::Display for DebounceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gestures Detected: {} | ", self.trigger_count)?;
        if self.cooldown_remaining > Duration::ZERO {
            write!(
                f,
                "Cooldown: {:.1}s",
                self.cooldown_remaining.as_secs_f64()
            )
        } else {
            f.write_str("Ready")
        }
    }
}

pub struct Debouncer {
    cooldown: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: DebounceState::default(),
        }
    }

    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(config.cooldown())
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    pub fn trigger_count(&self) -> u64 {
        self.state.trigger_count
    }

    /// Advance by one frame. Must be called once per frame in frame order.
    pub fn step(
        &mut self,
        label: GestureLabel,
        now: Duration,
        hand_present: bool,
    ) -> Option<TriggerEvent> {
        if !hand_present {
            if !self.state.last_emitted_label.is_unknown() {
                debug!(
                    "Hand lost, clearing latched gesture {}",
                    self.state.last_emitted_label
                );
            }
            self.state.last_emitted_label = GestureLabel::Unknown;
            return None;
        }

        if self.in_cooldown(now) {
            return None;
        }

        if label != self.state.last_emitted_label {
            if let Some(action_id) = label.action_id() {
                self.state.last_emitted_label = label;
                self.state.last_emission_time = Some(now);
                self.state.trigger_count += 1;

                info!(
                    "Triggered {} -> {} (count {})",
                    label, action_id, self.state.trigger_count
                );

                return Some(TriggerEvent {
                    action_id,
                    label,
                    emitted_at: now,
                });
            }
        }

        self.state.last_emitted_label = label;
        None
    }

    /// Time left before the next emission is allowed
    pub fn cooldown_remaining(&self, now: Duration) -> Duration {
        match self.state.last_emission_time {
            Some(last) => self.cooldown.saturating_sub(elapsed_since(last, now)),
            None => Duration::ZERO,
        }
    }

    pub fn phase(&self, now: Duration) -> DebouncePhase {
        if self.in_cooldown(now) {
            DebouncePhase::Cooldown
        } else if self.state.last_emitted_label.is_unknown() {
            DebouncePhase::Idle
        } else {
            DebouncePhase::Ready
        }
    }

    pub fn snapshot(&self, now: Duration) -> DebounceSnapshot {
        DebounceSnapshot {
            trigger_count: self.state.trigger_count,
            cooldown_remaining: self.cooldown_remaining(now),
            last_emitted_label: self.state.last_emitted_label,
            phase: self.phase(now),
        }
    }

    fn in_cooldown(&self, now: Duration) -> bool {
        match self.state.last_emission_time {
            Some(last) => elapsed_since(last, now) < self.cooldown,
            None => false,
        }
    }
}

/// A clock regression counts as no time elapsed
fn elapsed_since(last: Duration, now: Duration) -> Duration {
    now.checked_sub(last).unwrap_or(Duration::ZERO)
}
