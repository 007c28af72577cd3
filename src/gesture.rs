use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized hand poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    ThumbsUp,
    ThumbsDown,
    OneFinger,
    TwoFingers,
    ThreeFingers,
    FourFingers,
    /// No recognizable pose, also the no-hand sentinel
    #[default]
    Unknown,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 7] = [
        GestureLabel::ThumbsUp,
        GestureLabel::ThumbsDown,
        GestureLabel::OneFinger,
        GestureLabel::TwoFingers,
        GestureLabel::ThreeFingers,
        GestureLabel::FourFingers,
        GestureLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp => "THUMBS_UP",
            GestureLabel::ThumbsDown => "THUMBS_DOWN",
            GestureLabel::OneFinger => "ONE_FINGER",
            GestureLabel::TwoFingers => "TWO_FINGERS",
            GestureLabel::ThreeFingers => "THREE_FINGERS",
            GestureLabel::FourFingers => "FOUR_FINGERS",
            GestureLabel::Unknown => "UNKNOWN",
        }
    }

    /// Action identifier bound to this gesture, `None` for `Unknown`
    pub fn action_id(&self) -> Option<&'static str> {
        match self {
            GestureLabel::ThumbsUp => Some("option+a"),
            GestureLabel::ThumbsDown => Some("option+l"),
            GestureLabel::OneFinger => Some("option+1"),
            GestureLabel::TwoFingers => Some("option+2"),
            GestureLabel::ThreeFingers => Some("option+3"),
            GestureLabel::FourFingers => Some("option+4"),
            GestureLabel::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, GestureLabel::Unknown)
    }

    /// Every bound gesture with its action id, in table order
    pub fn key_bindings() -> impl Iterator<Item = (GestureLabel, &'static str)> {
        Self::ALL
            .into_iter()
            .filter_map(|label| label.action_id().map(|action_id| (label, action_id)))
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A modifier chord such as `option+a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifier: String,
    pub key: String,
}

impl KeyChord {
    pub fn parse(action_id: &str) -> Result<Self, ActionError> {
        match action_id.split_once('+') {
            Some((modifier, key)) if !modifier.is_empty() && !key.is_empty() => Ok(Self {
                modifier: modifier.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ActionError::InvalidChord {
                action_id: action_id.to_string(),
            }),
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.modifier, self.key)
    }
}
