use crate::config::{ActionConfig, ActionMode};
use crate::debounce::TriggerEvent;
use crate::error::ActionError;
use crate::gesture::KeyChord;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Delivers trigger events to the host, e.g. as a synthesized key chord.
///
/// Delivery failures are reported but never affect the debouncer, which has
/// already counted the event.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(&self, event: &TriggerEvent) -> Result<(), ActionError>;

    /// Get the name of this invoker for logging
    fn invoker_name(&self) -> &str;
}

/// Build the invoker selected by `action.mode`
pub fn invoker_from_config(config: &ActionConfig) -> Box<dyn ActionInvoker> {
    match config.mode {
        ActionMode::Log => Box::new(LoggingInvoker),
        ActionMode::Command => Box::new(CommandInvoker::new(config)),
    }
}

/// Logs the chord instead of sending it
pub struct LoggingInvoker;

#[async_trait]
impl ActionInvoker for LoggingInvoker {
    async fn invoke(&self, event: &TriggerEvent) -> Result<(), ActionError> {
        let chord = KeyChord::parse(event.action_id)?;
        info!("Would press {} for {}", chord, event.label);
        Ok(())
    }

    fn invoker_name(&self) -> &str {
        "log"
    }
}

/// Runs an external key injection program once per trigger
pub struct CommandInvoker {
    command: Vec<String>,
    modifier_name: String,
    timeout: Duration,
}

impl CommandInvoker {
    pub fn new(config: &ActionConfig) -> Self {
        Self {
            command: config.command.clone(),
            modifier_name: config.modifier_name.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Substitute `{action}`, `{modifier}` and `{key}` in every argument
    pub fn render_args(&self, action_id: &str) -> Result<Vec<String>, ActionError> {
        if self.command.is_empty() {
            return Err(ActionError::EmptyCommand);
        }

        let chord = KeyChord::parse(action_id)?;
        let modifier = if chord.modifier == "option" {
            self.modifier_name.as_str()
        } else {
            chord.modifier.as_str()
        };

        Ok(self
            .command
            .iter()
            .map(|arg| {
                arg.replace("{action}", action_id)
                    .replace("{modifier}", modifier)
                    .replace("{key}", &chord.key)
            })
            .collect())
    }
}

#[async_trait]
impl ActionInvoker for CommandInvoker {
    async fn invoke(&self, event: &TriggerEvent) -> Result<(), ActionError> {
        let args = self.render_args(event.action_id)?;
        let (program, rest) = args.split_first().ok_or(ActionError::EmptyCommand)?;

        debug!("Running {} {:?}", program, rest);

        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ActionError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = tokio::time::timeout(self.timeout, child.wait())
            .await
            .map_err(|_| ActionError::Timeout {
                program: program.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|source| ActionError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ActionError::CommandFailed {
                program: program.clone(),
                status: status.to_string(),
            });
        }

        info!("Sent {} for {}", event.action_id, event.label);
        Ok(())
    }

    fn invoker_name(&self) -> &str {
        "command"
    }
}
