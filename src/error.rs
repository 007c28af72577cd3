use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureKeysError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Landmark error: {0}")]
    Landmark(#[from] LandmarkError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl GestureKeysError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Malformed hand landmark input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("Invalid landmark set: expected {expected} points, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

/// Failures delivering a trigger to the action invoker
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid action id '{action_id}': expected <modifier>+<key>")]
    InvalidChord { action_id: String },

    #[error("No action command configured")]
    EmptyCommand,

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {status}")]
    CommandFailed { program: String, status: String },

    #[error("'{program}' timed out after {timeout_ms} ms")]
    Timeout { program: String, timeout_ms: u64 },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, GestureKeysError>;
