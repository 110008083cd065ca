use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::debug;

/// Number of trailing stderr lines kept per launch
pub const STDERR_TAIL_LINES: usize = 20;

/// How long to wait for the readers to hit EOF once the child has exited
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Captures a child's output streams without interpreting them.
///
/// Stdout lines are forwarded to the log at debug level. Stderr keeps a
/// bounded tail that the supervisor reports after the child exits.
pub struct OutputCapture {
    tasks: Vec<JoinHandle<()>>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
}

impl OutputCapture {
    /// Take the child's stdout/stderr pipes and start reading them
    pub fn attach(child: &mut Child, script_name: &str) -> Self {
        let stderr_tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        let mut tasks = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            tasks.push(tokio::spawn(Self::read_stdout_task(
                script_name.to_string(),
                stdout,
            )));
        }

        if let Some(stderr) = child.stderr.take() {
            tasks.push(tokio::spawn(Self::read_stderr_task(
                stderr,
                Arc::clone(&stderr_tail),
            )));
        }

        Self { tasks, stderr_tail }
    }

    async fn read_stdout_task<R>(script_name: String, stdout: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("[{}] {}", script_name, line);
        }
    }

    async fn read_stderr_task<R>(stderr: R, tail: Arc<Mutex<VecDeque<String>>>)
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut kept = tail.lock().unwrap_or_else(|e| e.into_inner());
            if kept.len() == STDERR_TAIL_LINES {
                kept.pop_front();
            }
            kept.push_back(line);
        }
    }

    /// Wait briefly for the readers to drain and return the stderr tail.
    ///
    /// A grandchild holding the pipes open must not stall the restart loop,
    /// so readers still running after the drain timeout are aborted.
    pub async fn finish(self) -> Vec<String> {
        for mut task in self.tasks {
            if tokio::time::timeout(DRAIN_TIMEOUT, &mut task).await.is_err() {
                task.abort();
            }
        }

        let mut tail = self.stderr_tail.lock().unwrap_or_else(|e| e.into_inner());
        let lines: Vec<String> = tail.drain(..).collect();
        lines
    }
}
