use crate::error::{RelaunchError, Result};
use crate::process::BackoffStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Script supervised when nothing else is configured
pub const DEFAULT_SCRIPT: &str = "main.py";

/// Lightweight script substituted by `--test`
pub const TEST_SCRIPT: &str = "simple_bot_test.py";

/// Stop signals accepted in configuration
pub const SUPPORTED_STOP_SIGNALS: [&str; 6] =
    ["SIGTERM", "SIGINT", "SIGQUIT", "SIGHUP", "SIGUSR1", "SIGUSR2"];

/// Supervisor configuration with every setting of a restart session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Path to the script or executable to supervise
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Program used to run the script (inferred from the extension when unset)
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Arguments forwarded to the script
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the child
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the child
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Restart budget for the session
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,

    /// Delay between a crash and the next launch (in seconds)
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,

    /// How the delay grows across restarts
    #[serde(default)]
    pub backoff: BackoffStrategy,

    /// Destination for structured log lines
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Location of the persisted stats record
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,

    /// Signal sent to the child on operator shutdown
    #[serde(default = "default_stop_signal")]
    pub stop_signal: String,

    /// Grace window before the child is force killed (in seconds)
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// How often the shutdown flag is checked while waiting (in milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

// Default value functions for serde
fn default_script() -> PathBuf {
    PathBuf::from(DEFAULT_SCRIPT)
}

fn default_max_restarts() -> usize {
    50
}

fn default_restart_delay() -> u64 {
    5
}

fn default_log_file() -> PathBuf {
    PathBuf::from("restart_manager.log")
}

fn default_stats_file() -> PathBuf {
    PathBuf::from("restart_stats.json")
}

fn default_stop_signal() -> String {
    "SIGTERM".to_string()
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    250
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            interpreter: None,
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            max_restarts: default_max_restarts(),
            restart_delay_secs: default_restart_delay(),
            backoff: BackoffStrategy::default(),
            log_file: default_log_file(),
            stats_file: default_stats_file(),
            stop_signal: default_stop_signal(),
            stop_timeout_secs: default_stop_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl SupervisorConfig {
    /// Load a supervisor configuration from a file (supports TOML and JSON).
    ///
    /// The result is not validated; call [`validate`](Self::validate) once
    /// command-line overrides have been applied.
    pub fn from_file(path: &Path) -> Result<SupervisorConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RelaunchError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(RelaunchError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();

        Ok(config)
    }

    fn parse_toml(contents: &str) -> Result<SupervisorConfig> {
        toml::from_str(contents)
            .map_err(|e| RelaunchError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<SupervisorConfig> {
        serde_json::from_str(contents)
            .map_err(|e| RelaunchError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.script.as_os_str().is_empty() {
            return Err(RelaunchError::ConfigValidationError(
                "script must not be empty".to_string(),
            ));
        }

        if let Some(ref interpreter) = self.interpreter {
            if interpreter.trim().is_empty() {
                return Err(RelaunchError::ConfigValidationError(
                    "interpreter must not be empty when set".to_string(),
                ));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(RelaunchError::ConfigValidationError(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }

        if self.stop_timeout_secs == 0 {
            return Err(RelaunchError::ConfigValidationError(
                "stop_timeout_secs must be at least 1".to_string(),
            ));
        }

        if !SUPPORTED_STOP_SIGNALS.contains(&self.stop_signal.as_str()) {
            return Err(RelaunchError::ConfigValidationError(format!(
                "Invalid stop_signal: {}. Must be one of: {}",
                self.stop_signal,
                SUPPORTED_STOP_SIGNALS.join(", ")
            )));
        }

        if let BackoffStrategy::Exponential { max_delay_secs } = self.backoff {
            if max_delay_secs < self.restart_delay_secs {
                return Err(RelaunchError::ConfigValidationError(format!(
                    "max_delay_secs ({}) must not be below restart_delay_secs ({})",
                    max_delay_secs, self.restart_delay_secs
                )));
            }
        }

        if let Some(ref cwd) = self.cwd {
            if !cwd.is_dir() {
                return Err(RelaunchError::ConfigValidationError(format!(
                    "Working directory does not exist or is not a directory: {}",
                    cwd.display()
                )));
            }
        }

        Ok(())
    }

    /// Expand `$VAR` and `${VAR}` references in paths, args and env values
    fn expand_env_vars(&mut self) {
        self.script = Self::expand_env_in_path(&self.script);

        if let Some(ref cwd) = self.cwd {
            self.cwd = Some(Self::expand_env_in_path(cwd));
        }

        self.args = self
            .args
            .iter()
            .map(|arg| Self::expand_env_in_string(arg))
            .collect();

        self.env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), Self::expand_env_in_string(v)))
            .collect();
    }

    /// Unset or malformed references are left as written
    fn expand_env_in_string(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut rest = s;

        while let Some(pos) = rest.find('$') {
            result.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            // `consumed` counts the bytes after `$` that belong to the reference
            let (name, consumed) = match after.strip_prefix('{') {
                Some(braced) => match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => ("", 0),
                },
                None => {
                    let end = after
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(after.len());
                    (&after[..end], end)
                }
            };

            let value = if name.is_empty() {
                None
            } else {
                std::env::var(name).ok()
            };

            match value {
                Some(value) => result.push_str(&value),
                None => result.push_str(&rest[pos..pos + 1 + consumed]),
            }

            rest = &after[consumed..];
        }

        result.push_str(rest);
        result
    }

    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        PathBuf::from(Self::expand_env_in_string(&path_str))
    }

    /// Human-readable identifier of the supervised script
    pub fn script_name(&self) -> String {
        self.script.display().to_string()
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
