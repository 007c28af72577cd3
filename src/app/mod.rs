mod orchestrator;
mod runtime;
mod shutdown;
mod types;


pub use orchestrator::GestureKeysApp;
pub use types::{SessionSummary, ShutdownReason};
