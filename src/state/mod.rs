// State module - Persistent restart statistics

use crate::error::{RelaunchError, Result};
use crate::process::RestartSession;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Restart statistics written for operator visibility.
///
/// Written after every restart decision and at shutdown. Read back only for
/// display, never to resume a session's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStats {
    pub total_restarts: usize,
    pub start_time: DateTime<Local>,
    pub last_restart: DateTime<Local>,
    pub uptime_seconds: f64,
    pub script_name: String,
}

impl PersistedStats {
    /// Snapshot a running session
    pub fn from_session(session: &RestartSession) -> Self {
        Self {
            total_restarts: session.restart_count,
            start_time: session.start_time,
            last_restart: session.last_restart.unwrap_or(session.start_time),
            uptime_seconds: session.runtime().as_secs_f64(),
            script_name: session.script_name.clone(),
        }
    }
}

/// Stats store handles persistence of the stats record to disk
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    /// Create a new stats store with the given file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the previous record, `None` if there is none yet
    pub fn load(&self) -> Result<Option<PersistedStats>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path).map_err(|e| {
            RelaunchError::StatsLoadError(format!("Failed to open stats file: {}", e))
        })?;

        let stats = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RelaunchError::StatsLoadError(format!("Failed to parse stats file: {}", e))
        })?;

        Ok(Some(stats))
    }

    /// Save the record with an atomic replace
    pub fn save(&self, stats: &PersistedStats) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    RelaunchError::StatsSaveError(format!(
                        "Failed to create stats directory: {}",
                        e
                    ))
                })?;
            }
        }

        // Write to a temporary file first so a kill mid-write never leaves a torn record
        let temp_path = self.path.with_extension("tmp");

        {
            let file = File::create(&temp_path).map_err(|e| {
                RelaunchError::StatsSaveError(format!("Failed to create temp stats file: {}", e))
            })?;

            let mut writer = BufWriter::new(file);

            serde_json::to_writer_pretty(&mut writer, stats).map_err(|e| {
                RelaunchError::StatsSaveError(format!("Failed to serialize stats: {}", e))
            })?;

            writer.flush().map_err(|e| {
                RelaunchError::StatsSaveError(format!("Failed to flush stats file: {}", e))
            })?;

            writer.get_ref().sync_all().map_err(|e| {
                RelaunchError::StatsSaveError(format!("Failed to sync stats file: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            RelaunchError::StatsSaveError(format!("Failed to rename temp stats file: {}", e))
        })?;

        Ok(())
    }

    /// Get the path to the stats file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
