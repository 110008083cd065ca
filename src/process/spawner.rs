use crate::config::SupervisorConfig;
use crate::error::{RelaunchError, Result};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Metadata returned when spawning a process
#[derive(Debug)]
pub struct SpawnedProcess {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,
}

/// Pick the program that runs the script.
///
/// An explicit interpreter always wins. Otherwise well-known script
/// extensions map to their usual interpreter, and anything else is executed
/// directly.
pub fn resolve_interpreter(config: &SupervisorConfig) -> Option<String> {
    if let Some(ref interpreter) = config.interpreter {
        return Some(interpreter.clone());
    }

    let extension = config.script.extension().and_then(|s| s.to_str())?;
    match extension {
        "py" => Some("python3".to_string()),
        "js" | "mjs" => Some("node".to_string()),
        "sh" => Some("sh".to_string()),
        _ => None,
    }
}

/// Build the command for one launch attempt
pub fn build_command(config: &SupervisorConfig) -> Command {
    let mut command = match resolve_interpreter(config) {
        Some(interpreter) => {
            let mut command = Command::new(interpreter);
            command.arg(&config.script);
            command
        }
        None => Command::new(&config.script),
    };

    if !config.args.is_empty() {
        command.args(&config.args);
    }

    if let Some(ref cwd) = config.cwd {
        command.current_dir(cwd);
    }

    for (key, value) in &config.env {
        command.env(key, value);
    }

    // Output is captured, never inherited
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    command
}

/// Spawn the supervised script
///
/// # Returns
/// * `Ok(SpawnedProcess)` - Successfully spawned process with metadata
/// * `Err(RelaunchError::SpawnError)` - The OS could not start the child
pub fn spawn_process(config: &SupervisorConfig) -> Result<SpawnedProcess> {
    let script_name = config.script_name();

    let child = build_command(config).spawn().map_err(|e| {
        RelaunchError::SpawnError(format!("Failed to spawn '{}': {}", script_name, e))
    })?;

    let pid = child.id().ok_or_else(|| {
        RelaunchError::SpawnError(format!("Failed to get PID for '{}'", script_name))
    })?;

    Ok(SpawnedProcess { child, pid })
}
