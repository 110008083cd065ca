use crate::config::SupervisorConfig;
use crate::error::{RelaunchError, Result};
use crate::process::output::OutputCapture;
use crate::process::terminate::terminate_child;
use crate::process::{
    spawn_process, Decision, ExitOutcome, RestartPolicy, RestartSession, SessionReport,
    StopReason, SupervisorState,
};
use crate::shutdown::ShutdownFlag;
use crate::state::{PersistedStats, StatsStore};
use std::time::Duration;
use tokio::process::Child;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

/// Keeps one child process alive within a restart budget.
///
/// The loop is strictly sequential: a new attempt is never spawned before the
/// previous child's exit has been observed and classified.
pub struct Supervisor {
    config: SupervisorConfig,
    policy: RestartPolicy,
    session: RestartSession,
    store: StatsStore,
    shutdown: ShutdownFlag,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, shutdown: ShutdownFlag) -> Self {
        let policy = RestartPolicy::new(
            config.max_restarts,
            config.restart_delay_secs,
            config.backoff,
        );
        let session = RestartSession::new(
            config.script_name(),
            config.max_restarts,
            config.restart_delay_secs,
        );
        let store = StatsStore::new(&config.stats_file);

        Self {
            config,
            policy,
            session,
            store,
            shutdown,
        }
    }

    pub fn session(&self) -> &RestartSession {
        &self.session
    }

    pub fn state(&self) -> SupervisorState {
        self.session.state
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run the session and map its outcome to a process exit code
    ///
    /// # Returns
    /// * `0` - Graceful stop, budget exhausted or operator stop
    /// * `1` - The script was missing at startup
    pub async fn run(&mut self) -> i32 {
        match self.run_session().await {
            Ok(_) => 0,
            Err(_) => 1,
        }
    }

    /// Run the restart loop until it stops
    ///
    /// # Returns
    /// * `Ok(SessionReport)` - The session ended, for any reason
    /// * `Err(RelaunchError::ScriptNotFound)` - Nothing was launched
    pub async fn run_session(&mut self) -> Result<SessionReport> {
        if !self.config.script.exists() {
            error!("Script '{}' not found!", self.session.script_name);
            self.session.state = SupervisorState::Stopped;
            return Err(RelaunchError::ScriptNotFound(self.config.script.clone()));
        }

        self.log_previous_session();

        info!(
            "Supervising '{}' (max restarts: {}, delay: {}s, backoff: {})",
            self.session.script_name,
            self.policy.max_restarts,
            self.policy.initial_delay_secs,
            self.policy.backoff_strategy
        );

        let stop_reason = self.restart_loop().await;

        self.session.state = SupervisorState::Stopped;
        self.persist_stats();

        let report = self.session.report(stop_reason);
        info!(
            "Session finished ({}): {} restarts over {} launches, runtime {:.1}s, average uptime {:.1}s",
            report.stop_reason,
            report.restarts,
            report.launches,
            report.runtime.as_secs_f64(),
            report.average_uptime.as_secs_f64()
        );
        info!("Restart manager exiting");

        Ok(report)
    }

    async fn restart_loop(&mut self) -> StopReason {
        loop {
            if self.shutdown.is_requested() {
                info!("Stop requested, not launching");
                return StopReason::OperatorRequested;
            }

            let outcome = self.launch_once().await;
            self.session.state = SupervisorState::Exited(outcome.code());

            if let Decision::Stop(reason) = outcome.classify(self.shutdown.is_requested()) {
                info!("Stopping restart manager: {}", reason);
                return reason;
            }

            if !self.policy.should_restart(self.session.restart_count) {
                error!(
                    "Maximum restart limit ({}) reached!",
                    self.policy.max_restarts
                );
                return StopReason::BudgetExhausted;
            }

            let delay = self.policy.calculate_delay(self.session.restart_count);
            self.session.record_restart();
            self.persist_stats();

            info!(
                "Restart {}/{} scheduled, waiting {}s",
                self.session.restart_count,
                self.policy.max_restarts,
                delay.as_secs()
            );

            if !self.wait_before_restart(delay).await {
                info!("Stop requested during restart delay");
                return StopReason::OperatorRequested;
            }
        }
    }

    /// Launch the child once and wait for it to end
    async fn launch_once(&mut self) -> ExitOutcome {
        self.session.record_launch();
        let name = self.session.script_name.clone();

        info!("Starting '{}' (attempt #{})", name, self.session.launches);

        let spawned = match spawn_process(&self.config) {
            Ok(spawned) => spawned,
            Err(e) => {
                error!("{}", e);
                return ExitOutcome::SpawnFailed(e.to_string());
            }
        };

        self.session.state = SupervisorState::Running;
        info!("'{}' running (PID: {})", name, spawned.pid);

        let mut child = spawned.child;
        let capture = OutputCapture::attach(&mut child, &name);
        let outcome = self.wait_for_exit(&mut child, &name).await;

        let stderr = capture.finish().await;
        if !stderr.is_empty() {
            error!("'{}' stderr:\n{}", name, stderr.join("\n"));
        }

        match &outcome {
            ExitOutcome::Exited(0) => info!("'{}' exited gracefully (exit code 0)", name),
            ExitOutcome::Interrupted => info!("'{}' was stopped by the operator", name),
            crash => warn!("'{}' crashed: {}", name, crash),
        }

        outcome
    }

    /// Wait for the child, checking the shutdown flag every poll interval
    async fn wait_for_exit(&self, child: &mut Child, name: &str) -> ExitOutcome {
        let poll = self.config.poll_interval();

        loop {
            match tokio::time::timeout(poll, child.wait()).await {
                Ok(Ok(status)) => return ExitOutcome::from_status(status),
                Ok(Err(e)) => return ExitOutcome::WaitFailed(e.to_string()),
                Err(_) => {
                    if !self.shutdown.is_requested() {
                        continue;
                    }

                    info!("Stop requested while '{}' is running", name);
                    if let Err(e) = terminate_child(
                        child,
                        name,
                        &self.config.stop_signal,
                        self.config.stop_timeout(),
                    )
                    .await
                    {
                        // kill_on_drop reaps whatever is left once the handle goes away
                        error!("{}", e);
                    }
                    return ExitOutcome::Interrupted;
                }
            }
        }
    }

    /// Sleep out the restart delay in poll-sized slices.
    ///
    /// Returns `false` if a stop was requested before the delay elapsed.
    async fn wait_before_restart(&self, delay: Duration) -> bool {
        let poll = self.config.poll_interval();
        let deadline = Instant::now() + delay;

        loop {
            if self.shutdown.is_requested() {
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                return true;
            }

            sleep((deadline - now).min(poll)).await;
        }
    }

    fn persist_stats(&self) {
        let stats = PersistedStats::from_session(&self.session);
        if let Err(e) = self.store.save(&stats) {
            warn!("{} ({})", e, self.store.path().display());
        }
    }

    fn log_previous_session(&self) {
        match self.store.load() {
            Ok(Some(previous)) => info!(
                "Previous session: {} restarts (script '{}', started {})",
                previous.total_restarts,
                previous.script_name,
                previous.start_time.format("%Y-%m-%d %H:%M:%S")
            ),
            Ok(None) => {}
            Err(e) => warn!("{} ({})", e, self.store.path().display()),
        }
    }
}
