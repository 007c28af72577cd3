pub mod action;
pub mod app;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod events;
pub mod gesture;
pub mod keyboard_input;
pub mod landmarks;
pub mod source;

pub use action::{invoker_from_config, ActionInvoker, CommandInvoker, LoggingInvoker};
pub use app::{GestureKeysApp, SessionSummary, ShutdownReason};
pub use classifier::{classify, classify_points};
pub use config::GestureKeysConfig;
pub use debounce::{DebouncePhase, DebounceSnapshot, Debouncer, TriggerEvent};
pub use engine::{FrameOutcome, GestureEngine};
pub use error::{GestureKeysError, Result};
pub use events::{EventBus, EventMetrics, EventReceiver, GestureKeysEvent};
pub use gesture::{GestureLabel, KeyChord};
pub use landmarks::{Landmark, LandmarkSet};
pub use source::{parse_frame_line, FrameInput, HandFrame, LandmarkStreamReader, StreamClock};
