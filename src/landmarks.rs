//! Hand landmark data model.
//!
//! A [`LandmarkSet`] is the 21-point hand skeleton produced by an external
//! hand tracker for one frame. Coordinates are normalized to the frame with
//! `y` growing downward; `z` is carried along but never consulted.

use crate::error::LandmarkError;
use serde::{Deserialize, Serialize};

/// Number of points in a hand skeleton
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// A single normalized landmark point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// The non-thumb fingers, each with a tip and a PIP joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(&self) -> usize {
        match self {
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }

    pub fn pip(&self) -> usize {
        match self {
            Finger::Index => INDEX_PIP,
            Finger::Middle => MIDDLE_PIP,
            Finger::Ring => RING_PIP,
            Finger::Pinky => PINKY_PIP,
        }
    }
}

/// Exactly 21 landmarks for one tracked hand
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a set from an arbitrary slice, rejecting the wrong cardinality
    pub fn from_points(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| LandmarkError::InvalidInput {
                    expected: LANDMARK_COUNT,
                    actual: points.len(),
                })?;
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.points[THUMB_TIP]
    }

    pub fn thumb_ip(&self) -> &Landmark {
        &self.points[THUMB_IP]
    }

    /// Tip above its PIP joint (smaller y)
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.points[finger.tip()].y < self.points[finger.pip()].y
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::from_points(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_accepts_21() {
        let points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let set = LandmarkSet::from_points(&points).unwrap();
        assert_eq!(set.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_from_points_rejects_wrong_count() {
        let points = vec![Landmark::default(); 20];
        assert_eq!(
            LandmarkSet::from_points(&points),
            Err(LandmarkError::InvalidInput {
                expected: 21,
                actual: 20
            })
        );

        let err = LandmarkSet::try_from(vec![Landmark::default(); 22]).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::InvalidInput {
                expected: 21,
                actual: 22
            }
        );
    }

    #[test]
    fn test_extension_uses_downward_y() {
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[INDEX_TIP].y = 0.2;
        points[INDEX_PIP].y = 0.4;
        points[MIDDLE_TIP].y = 0.6;
        points[MIDDLE_PIP].y = 0.4;
        let set = LandmarkSet::new(points);

        assert!(set.is_extended(Finger::Index));
        assert!(!set.is_extended(Finger::Middle));
        // equal y is not extended
        assert!(!set.is_extended(Finger::Ring));
    }
}
