use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the relaunch supervisor
#[derive(Debug, Error)]
pub enum RelaunchError {
    // Process-related errors
    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    #[error("Failed to stop process {0}: {1}")]
    StopError(String, String),

    #[error("Signal error: {0}")]
    SignalError(String),

    // Stats record errors
    #[error("Failed to load stats: {0}")]
    StatsLoadError(String),

    #[error("Failed to save stats: {0}")]
    StatsSaveError(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Log-related errors
    #[error("Log error: {0}")]
    LogError(String),
}

/// Result type alias for relaunch operations
pub type Result<T> = std::result::Result<T, RelaunchError>;
