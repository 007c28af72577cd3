use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GestureKeysConfig {
    pub debounce: DebounceConfig,
    pub source: SourceConfig,
    pub action: ActionConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DebounceConfig {
    /// Minimum time between two trigger events, in seconds
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: f64,
}

impl DebounceConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_seconds).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// Landmark stream in JSON lines, "-" for stdin
    #[serde(default = "default_source_path")]
    pub path: String,

    /// Frames buffered between the reader task and the frame loop
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl SourceConfig {
    pub fn is_stdin(&self) -> bool {
        self.path == "-"
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    /// Only log the chord that would be sent
    Log,
    /// Launch an external key injection command
    Command,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ActionConfig {
    #[serde(default = "default_action_mode")]
    pub mode: ActionMode,

    /// Program and arguments; `{action}`, `{modifier}` and `{key}` are substituted
    #[serde(default = "default_action_command")]
    pub command: Vec<String>,

    /// Name substituted for the `option` modifier
    #[serde(default = "default_modifier_name")]
    pub modifier_name: String,

    /// Maximum time the injection command may run
    #[serde(default = "default_action_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Interval between periodic status lines, 0 disables them
    #[serde(default = "default_status_interval_seconds")]
    pub status_interval_seconds: u64,

    /// Quit on `q`/`Esc` from the terminal (ignored when reading stdin)
    #[serde(default = "default_keyboard_quit")]
    pub keyboard_quit: bool,
}

impl GestureKeysConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("debounce.cooldown_seconds", default_cooldown_seconds())?
            .set_default("source.path", default_source_path())?
            .set_default(
                "source.channel_capacity",
                default_channel_capacity() as i64,
            )?
            .set_default("action.mode", "log")?
            .set_default("action.command", default_action_command())?
            .set_default("action.modifier_name", default_modifier_name())?
            .set_default("action.timeout_ms", default_action_timeout_ms())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default(
                "system.status_interval_seconds",
                default_status_interval_seconds(),
            )?
            .set_default("system.keyboard_quit", default_keyboard_quit())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // GESTURE_KEYS_DEBOUNCE__COOLDOWN_SECONDS=2.5
            .add_source(
                Environment::with_prefix("GESTURE_KEYS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: GestureKeysConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.debounce.cooldown_seconds.is_finite() || self.debounce.cooldown_seconds < 0.0 {
            return Err(ConfigError::Message(
                "Debounce cooldown_seconds must be a non-negative number".to_string(),
            ));
        }

        if self.source.path.is_empty() {
            return Err(ConfigError::Message(
                "Source path must not be empty (use \"-\" for stdin)".to_string(),
            ));
        }

        if self.source.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "Source channel capacity must be greater than 0".to_string(),
            ));
        }

        if self.action.mode == ActionMode::Command && self.action.command.is_empty() {
            return Err(ConfigError::Message(
                "Action command must not be empty in command mode".to_string(),
            ));
        }

        if self.action.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Action timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for GestureKeysConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig {
                cooldown_seconds: default_cooldown_seconds(),
            },
            source: SourceConfig {
                path: default_source_path(),
                channel_capacity: default_channel_capacity(),
            },
            action: ActionConfig {
                mode: default_action_mode(),
                command: default_action_command(),
                modifier_name: default_modifier_name(),
                timeout_ms: default_action_timeout_ms(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                status_interval_seconds: default_status_interval_seconds(),
                keyboard_quit: default_keyboard_quit(),
            },
        }
    }
}

// Default value functions
fn default_cooldown_seconds() -> f64 {
    1.0
}

fn default_source_path() -> String {
    "-".to_string()
}
fn default_channel_capacity() -> usize {
    64
}

fn default_action_mode() -> ActionMode {
    ActionMode::Log
}
fn default_action_command() -> Vec<String> {
    vec![
        "xdotool".to_string(),
        "key".to_string(),
        "{modifier}+{key}".to_string(),
    ]
}
fn default_modifier_name() -> String {
    "alt".to_string()
}
fn default_action_timeout_ms() -> u64 {
    2000
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_status_interval_seconds() -> u64 {
    5
}
fn default_keyboard_quit() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GestureKeysConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.debounce.cooldown(), Duration::from_secs(1));
        assert!(config.source.is_stdin());
        assert_eq!(config.action.mode, ActionMode::Log);
    }

    #[test]
    fn test_config_validation() {
        let mut config = GestureKeysConfig::default();

        config.debounce.cooldown_seconds = -1.0;
        assert!(config.validate().is_err());
        config.debounce.cooldown_seconds = f64::NAN;
        assert!(config.validate().is_err());
        config.debounce.cooldown_seconds = 2.5;
        assert!(config.validate().is_ok());

        config.action.mode = ActionMode::Command;
        config.action.command.clear();
        assert!(config.validate().is_err());
        config.action.command = default_action_command();
        assert!(config.validate().is_ok());

        config.source.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cooldown_of_invalid_value_is_zero() {
        let config = DebounceConfig {
            cooldown_seconds: -3.0,
        };
        assert_eq!(config.cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[debounce]
cooldown_seconds = 2.5

[action]
mode = "command"
command = ["ydotool", "key", "{{action}}"]
"#
        )
        .unwrap();

        let config = GestureKeysConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.debounce.cooldown(), Duration::from_millis(2500));
        assert_eq!(config.action.mode, ActionMode::Command);
        assert_eq!(config.action.command, vec!["ydotool", "key", "{action}"]);
        // untouched sections fall back to defaults
        assert_eq!(config.action.modifier_name, "alt");
        assert_eq!(config.source.path, "-");
        assert_eq!(config.system.event_bus_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = GestureKeysConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("cooldown_seconds = 1.0"));

        let parsed: GestureKeysConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
