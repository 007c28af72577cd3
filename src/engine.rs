use crate::classifier::classify_points;
use crate::debounce::{DebounceSnapshot, Debouncer, TriggerEvent};
use crate::error::LandmarkError;
use crate::gesture::GestureLabel;
use crate::landmarks::Landmark;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub label: GestureLabel,
    pub hand_present: bool,
    pub trigger: Option<TriggerEvent>,
    /// Set when the frame carried a malformed landmark set
    pub invalid: Option<LandmarkError>,
    /// The label differs from the previous frame's
    pub label_changed: bool,
    /// The hand was present on the previous frame but not on this one
    pub hand_lost: bool,
}

/// Classifier plus debouncer for one capture session
pub struct GestureEngine {
    debouncer: Debouncer,
    last_label: GestureLabel,
    hand_was_present: bool,
    frames_processed: u64,
}

impl GestureEngine {
    pub fn new(debouncer: Debouncer) -> Self {
        Self {
            debouncer,
            last_label: GestureLabel::Unknown,
            hand_was_present: false,
            frames_processed: 0,
        }
    }

    /// Classify and debounce one frame. A malformed landmark set is treated
    /// as no hand for that frame.
    pub fn process(&mut self, landmarks: Option<&[Landmark]>, now: Duration) -> FrameOutcome {
        self.frames_processed += 1;

        let mut invalid = None;
        let (label, hand_present) = match landmarks {
            Some(points) => match classify_points(points) {
                Ok(label) => (label, true),
                Err(e) => {
                    warn!("Ignoring frame {}: {}", self.frames_processed, e);
                    invalid = Some(e);
                    (GestureLabel::Unknown, false)
                }
            },
            None => (GestureLabel::Unknown, false),
        };

        let trigger = self.debouncer.step(label, now, hand_present);

        let label_changed = label != self.last_label;
        if label_changed {
            debug!("Gesture {} -> {}", self.last_label, label);
        }
        let hand_lost = self.hand_was_present && !hand_present;

        self.last_label = label;
        self.hand_was_present = hand_present;

        FrameOutcome {
            label,
            hand_present,
            trigger,
            invalid,
            label_changed,
            hand_lost,
        }
    }

    pub fn snapshot(&self, now: Duration) -> DebounceSnapshot {
        self.debouncer.snapshot(now)
    }

    pub fn trigger_count(&self) -> u64 {
        self.debouncer.trigger_count()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::{pose, thumbs_down, thumbs_up, Thumb};

    fn engine() -> GestureEngine {
        GestureEngine::new(Debouncer::new(Duration::from_secs(1)))
    }

    #[test]
    fn test_hand_frame_triggers() {
        let mut engine = engine();
        let hand = thumbs_up();

        let outcome = engine.process(Some(hand.points()), Duration::ZERO);

        assert_eq!(outcome.label, GestureLabel::ThumbsUp);
        assert!(outcome.hand_present);
        assert!(outcome.label_changed);
        assert_eq!(outcome.trigger.unwrap().action_id, "option+a");
        assert_eq!(engine.trigger_count(), 1);
    }

    #[test]
    fn test_malformed_frame_counts_as_no_hand() {
        let mut engine = engine();
        let hand = thumbs_up();

        engine.process(Some(hand.points()), Duration::ZERO);
        let outcome = engine.process(Some(&hand.points()[..20]), Duration::from_millis(100));

        assert_eq!(
            outcome.invalid,
            Some(LandmarkError::InvalidInput {
                expected: 21,
                actual: 20
            })
        );
        assert!(!outcome.hand_present);
        assert!(outcome.hand_lost);
        assert_eq!(
            engine.debouncer().state().last_emitted_label,
            GestureLabel::Unknown
        );
    }

    #[test]
    fn test_hand_lost_reported_once() {
        let mut engine = engine();
        let hand = thumbs_down();

        engine.process(Some(hand.points()), Duration::ZERO);
        assert!(engine.process(None, Duration::from_millis(50)).hand_lost);
        assert!(!engine.process(None, Duration::from_millis(100)).hand_lost);
        assert_eq!(engine.frames_processed(), 3);
    }

    #[test]
    fn test_counting_sequence_respects_cooldown() {
        let mut engine = engine();
        let one = pose(Thumb::Level, [true, false, false, false]);
        let two = pose(Thumb::Up, [true, true, false, false]);

        let fired: Vec<_> = [
            (&one, 0),
            (&two, 300),
            (&two, 900),
            (&two, 1100),
            (&one, 1200),
            (&one, 2300),
        ]
        .into_iter()
        .filter_map(|(hand, ms)| {
            engine
                .process(Some(hand.points()), Duration::from_millis(ms))
                .trigger
                .map(|t| t.action_id)
        })
        .collect();

        assert_eq!(fired, vec!["option+1", "option+2", "option+1"]);
        assert_eq!(
            engine.snapshot(Duration::from_millis(2500)).to_string(),
            "Gestures Detected: 3 | Cooldown: 0.8s"
        );
    }
}
