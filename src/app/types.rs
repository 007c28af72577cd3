/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    /// The landmark stream reached its end
    SourceEnded,
    /// The landmark stream could not be read
    SourceFailed(String),
}

impl ShutdownReason {
    /// Process exit code for this reason
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::SourceFailed(_) => 1,
            _ => 0,
        }
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub reason: ShutdownReason,
    pub frames_processed: u64,
    pub trigger_count: u64,
    pub hand_losses: u64,
    pub invalid_frames: u64,
    pub action_failures: u64,
}
