use chrono::{DateTime, Local};
use std::process::ExitStatus;
use std::time::{Duration, Instant};

/// Life-cycle state of a supervisor session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Launching,
    Running,
    Exited(Option<i32>),
    Restarting,
    Stopped,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Launching => write!(f, "launching"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Exited(Some(code)) => write!(f, "exited({})", code),
            SupervisorState::Exited(None) => write!(f, "exited"),
            SupervisorState::Restarting => write!(f, "restarting"),
            SupervisorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a single launch attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Child exited on its own with a status code
    Exited(i32),
    /// Child was terminated by a signal it did not expect
    Signaled(i32),
    /// The OS refused to start the child
    SpawnFailed(String),
    /// Waiting on the child failed
    WaitFailed(String),
    /// Operator stop was requested and the child was terminated
    Interrupted,
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }

        ExitOutcome::Exited(-1)
    }

    /// Exit code reported by the child, if it produced one
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            _ => None,
        }
    }

    /// Apply the exit classification policy.
    ///
    /// Exit code 0 is a graceful stop, an operator stop is never a crash, and
    /// everything else (including spawn failures) asks for a restart. The
    /// restart budget is checked separately by the caller.
    pub fn classify(&self, stop_requested: bool) -> Decision {
        match self {
            ExitOutcome::Exited(0) => Decision::Stop(StopReason::Graceful),
            ExitOutcome::Interrupted => Decision::Stop(StopReason::OperatorRequested),
            _ if stop_requested => Decision::Stop(StopReason::OperatorRequested),
            _ => Decision::Restart,
        }
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit code {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "killed by signal {}", signal),
            ExitOutcome::SpawnFailed(reason) => write!(f, "spawn failed: {}", reason),
            ExitOutcome::WaitFailed(reason) => write!(f, "wait failed: {}", reason),
            ExitOutcome::Interrupted => write!(f, "interrupted by operator"),
        }
    }
}

/// Outcome of classifying an exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Restart,
    Stop(StopReason),
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Graceful,
    OperatorRequested,
    BudgetExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Graceful => write!(f, "graceful exit"),
            StopReason::OperatorRequested => write!(f, "operator requested"),
            StopReason::BudgetExhausted => write!(f, "restart limit reached"),
        }
    }
}

/// In-memory state of one supervisor run
#[derive(Debug, Clone)]
pub struct RestartSession {
    pub script_name: String,
    pub max_restarts: usize,
    pub restart_delay_secs: u64,
    pub restart_count: usize,
    pub launches: usize,
    pub start_time: DateTime<Local>,
    pub last_restart: Option<DateTime<Local>>,
    pub state: SupervisorState,
    started: Instant,
}

impl RestartSession {
    pub fn new(script_name: String, max_restarts: usize, restart_delay_secs: u64) -> Self {
        Self {
            script_name,
            max_restarts,
            restart_delay_secs,
            restart_count: 0,
            launches: 0,
            start_time: Local::now(),
            last_restart: None,
            state: SupervisorState::Idle,
            started: Instant::now(),
        }
    }

    pub fn record_launch(&mut self) {
        self.launches += 1;
        self.state = SupervisorState::Launching;
    }

    pub fn record_restart(&mut self) {
        self.restart_count += 1;
        self.last_restart = Some(Local::now());
        self.state = SupervisorState::Restarting;
    }

    /// Time since the session started
    pub fn runtime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Runtime divided over every launch attempt
    pub fn average_uptime(&self) -> Duration {
        let attempts = u32::try_from(self.launches.max(1)).unwrap_or(u32::MAX);
        self.runtime() / attempts
    }

    pub fn report(&self, stop_reason: StopReason) -> SessionReport {
        SessionReport {
            script_name: self.script_name.clone(),
            launches: self.launches,
            restarts: self.restart_count,
            stop_reason,
            runtime: self.runtime(),
            average_uptime: self.average_uptime(),
        }
    }
}

/// Summary returned when a session ends
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub script_name: String,
    pub launches: usize,
    pub restarts: usize,
    pub stop_reason: StopReason,
    pub runtime: Duration,
    pub average_uptime: Duration,
}
