//! Single-frame gesture classification.
//!
//! A finger counts as extended when its tip sits above its PIP joint. Since
//! image coordinates grow downward, "above" means a numerically smaller `y`.
//! The thumb only matters for the fist poses; finger counting ignores it.

use crate::error::LandmarkError;
use crate::gesture::GestureLabel;
use crate::landmarks::{Finger, Landmark, LandmarkSet};
use tracing::trace;

/// Classify a well-formed landmark set. Ambiguous poses yield `Unknown`.
pub fn classify(landmarks: &LandmarkSet) -> GestureLabel {
    let [index, middle, ring, pinky] = Finger::ALL.map(|finger| landmarks.is_extended(finger));
    let fingers_closed = !(index || middle || ring || pinky);

    let thumb_tip = landmarks.thumb_tip().y;
    let thumb_ip = landmarks.thumb_ip().y;
    let thumb_up = thumb_tip < thumb_ip;
    let thumb_down = thumb_tip > thumb_ip;

    let label = match (index, middle, ring, pinky) {
        _ if fingers_closed && thumb_up => GestureLabel::ThumbsUp,
        _ if fingers_closed && thumb_down => GestureLabel::ThumbsDown,
        (true, false, false, false) => GestureLabel::OneFinger,
        (true, true, false, false) => GestureLabel::TwoFingers,
        (true, true, true, false) => GestureLabel::ThreeFingers,
        (true, true, true, true) => GestureLabel::FourFingers,
        _ => GestureLabel::Unknown,
    };

    trace!(
        index,
        middle,
        ring,
        pinky,
        thumb_up,
        thumb_down,
        "classified as {}",
        label
    );
    label
}

/// Classify raw points, rejecting sets without exactly 21 entries
pub fn classify_points(points: &[Landmark]) -> Result<GestureLabel, LandmarkError> {
    LandmarkSet::from_points(points).map(|set| classify(&set))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::landmarks::{
        Finger, Landmark, LandmarkSet, LANDMARK_COUNT, THUMB_IP, THUMB_TIP,
    };

    #[derive(Debug, Clone, Copy)]
    pub enum Thumb {
        Up,
        Down,
        Level,
    }

    /// Build a hand with the given thumb direction and fingers extended
    /// in index, middle, ring, pinky order
    pub fn pose(thumb: Thumb, extended: [bool; 4]) -> LandmarkSet {
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];

        points[THUMB_IP].y = 0.5;
        points[THUMB_TIP].y = match thumb {
            Thumb::Up => 0.35,
            Thumb::Down => 0.65,
            Thumb::Level => 0.5,
        };

        for (finger, up) in Finger::ALL.into_iter().zip(extended) {
            points[finger.pip()].y = 0.5;
            points[finger.tip()].y = if up { 0.3 } else { 0.6 };
        }

        LandmarkSet::new(points)
    }

    pub fn thumbs_up() -> LandmarkSet {
        pose(Thumb::Up, [false; 4])
    }

    pub fn thumbs_down() -> LandmarkSet {
        pose(Thumb::Down, [false; 4])
    }
}
