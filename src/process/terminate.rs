use crate::error::{RelaunchError, Result};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Map a configured signal name to a nix signal
#[cfg(unix)]
pub fn parse_signal(signal_name: &str) -> Result<Signal> {
    match signal_name {
        "SIGTERM" => Ok(Signal::SIGTERM),
        "SIGINT" => Ok(Signal::SIGINT),
        "SIGQUIT" => Ok(Signal::SIGQUIT),
        "SIGHUP" => Ok(Signal::SIGHUP),
        "SIGUSR1" => Ok(Signal::SIGUSR1),
        "SIGUSR2" => Ok(Signal::SIGUSR2),
        _ => Err(RelaunchError::SignalError(format!(
            "Invalid signal name: {}",
            signal_name
        ))),
    }
}

/// Stop a running child: ask politely, then force kill after `timeout`.
///
/// Always reaps the child before returning so no zombie is left behind.
pub async fn terminate_child(
    child: &mut Child,
    script_name: &str,
    stop_signal: &str,
    timeout: Duration,
) -> Result<ExitStatus> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let stop = parse_signal(stop_signal)?;
            let raw_pid = i32::try_from(pid).map_err(|_| {
                RelaunchError::StopError(script_name.to_string(), format!("PID {} out of range", pid))
            })?;

            tracing::info!(
                "Terminating {} (PID: {}) with {}",
                script_name,
                pid,
                stop_signal
            );

            match signal::kill(Pid::from_raw(raw_pid), stop) {
                Ok(()) => {}
                // Already gone, nothing left to signal
                Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => {
                    return Err(RelaunchError::StopError(
                        script_name.to_string(),
                        format!("Failed to send {}: {}", stop_signal, e),
                    ))
                }
            }

            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::info!("{} exited after {} with {}", script_name, stop_signal, status);
                    return Ok(status);
                }
                Ok(Err(e)) => {
                    return Err(RelaunchError::StopError(
                        script_name.to_string(),
                        format!("Wait failed: {}", e),
                    ));
                }
                Err(_) => {
                    tracing::warn!(
                        "{} did not exit within {:?}, force killing",
                        script_name,
                        timeout
                    );
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (stop_signal, timeout);
    }

    force_kill(child, script_name).await
}

async fn force_kill(child: &mut Child, script_name: &str) -> Result<ExitStatus> {
    child.kill().await.map_err(|e| {
        RelaunchError::StopError(script_name.to_string(), format!("Failed to kill: {}", e))
    })?;

    child.wait().await.map_err(|e| {
        RelaunchError::StopError(script_name.to_string(), format!("Wait failed: {}", e))
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::time::Instant;
    use tokio::process::Command;

    fn spawn_shell(script: &str) -> Child {
        Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    #[test]
    fn test_parse_signal() {
        assert_eq!(parse_signal("SIGTERM").unwrap(), Signal::SIGTERM);
        assert_eq!(parse_signal("SIGINT").unwrap(), Signal::SIGINT);
        assert!(matches!(
            parse_signal("SIGBOGUS"),
            Err(RelaunchError::SignalError(_))
        ));
    }

    #[tokio::test]
    async fn test_terminate_responsive_child() {
        let mut child = spawn_shell("exec sleep 30");

        let start = Instant::now();
        let status = terminate_child(&mut child, "sleeper", "SIGTERM", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!status.success());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_terminate_force_kills_stubborn_child() {
        let mut child = spawn_shell("trap '' TERM; while true; do sleep 1; done");

        // Give the shell a moment to install its trap
        tokio::time::sleep(Duration::from_millis(200)).await;

        let start = Instant::now();
        let status = terminate_child(&mut child, "stubborn", "SIGTERM", Duration::from_secs(1))
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(!status.success());
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_terminate_already_exited_child() {
        let mut child = spawn_shell("exit 0");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = terminate_child(&mut child, "quick", "SIGTERM", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(status.success());
    }
}
