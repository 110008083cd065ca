// CLI module - User-facing command-line interface

mod output;

use crate::config::{SupervisorConfig, TEST_SCRIPT};
use crate::error::{RelaunchError, Result};
use crate::logs::init_logging;
use crate::process::{BackoffStrategy, Supervisor};
use crate::shutdown::{install_signal_handlers, ShutdownFlag};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Cap used for exponential backoff when none is configured
const DEFAULT_MAX_DELAY_SECS: u64 = 300;

/// relaunch - keep a script running, restarting it when it crashes
#[derive(Parser, Debug)]
#[command(name = "relaunch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script or executable to supervise [default: main.py]
    #[arg(long)]
    script: Option<PathBuf>,

    /// Maximum number of restarts [default: 50]
    #[arg(long)]
    max_restarts: Option<usize>,

    /// Delay between restarts in seconds [default: 5]
    #[arg(long)]
    delay: Option<u64>,

    /// Log file path [default: restart_manager.log]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run the simple test script instead
    #[arg(long)]
    test: bool,

    /// Stats file path [default: restart_stats.json]
    #[arg(long)]
    stats_file: Option<PathBuf>,

    /// Program used to run the script (inferred from the extension by default)
    #[arg(long)]
    interpreter: Option<String>,

    /// Seconds to wait for the script to exit before force killing it [default: 10]
    #[arg(long)]
    stop_timeout: Option<u64>,

    /// How the restart delay grows [default: fixed]
    #[arg(long, value_enum)]
    backoff: Option<BackoffKind>,

    /// Upper bound for exponential backoff in seconds [default: 300]
    #[arg(long)]
    max_delay: Option<u64>,

    /// Configuration file (.toml or .json); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Arguments to pass to the script
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackoffKind {
    Fixed,
    Exponential,
}

impl Cli {
    /// Run the CLI application and return the process exit code
    pub async fn run() -> Result<i32> {
        let cli = Cli::parse();
        cli.execute().await
    }

    async fn execute(&self) -> Result<i32> {
        let config = self.build_config()?;

        if self.test {
            output::print_info(&format!("Running in test mode with {}", TEST_SCRIPT));
        }

        init_logging(&config.log_file)?;

        let shutdown = ShutdownFlag::new();
        install_signal_handlers(&shutdown)?;

        let mut supervisor = Supervisor::new(config, shutdown);
        output::print_banner(supervisor.config(), supervisor.session().start_time);

        match supervisor.run_session().await {
            Ok(report) => {
                output::print_summary(&report, supervisor.config());
                Ok(0)
            }
            Err(RelaunchError::ScriptNotFound(path)) => {
                output::print_error(&format!("Script '{}' not found", path.display()));
                Ok(1)
            }
            Err(e) => Err(e),
        }
    }

    /// Merge defaults, the optional config file and explicit flags
    pub fn build_config(&self) -> Result<SupervisorConfig> {
        let mut config = match self.config {
            Some(ref path) => SupervisorConfig::from_file(path)?,
            None => SupervisorConfig::default(),
        };

        if let Some(ref script) = self.script {
            config.script = script.clone();
        }
        if self.test {
            config.script = PathBuf::from(TEST_SCRIPT);
        }
        if let Some(max_restarts) = self.max_restarts {
            config.max_restarts = max_restarts;
        }
        if let Some(delay) = self.delay {
            config.restart_delay_secs = delay;
        }
        if let Some(ref log_file) = self.log_file {
            config.log_file = log_file.clone();
        }
        if let Some(ref stats_file) = self.stats_file {
            config.stats_file = stats_file.clone();
        }
        if let Some(ref interpreter) = self.interpreter {
            config.interpreter = Some(interpreter.clone());
        }
        if let Some(stop_timeout) = self.stop_timeout {
            config.stop_timeout_secs = stop_timeout;
        }
        if !self.args.is_empty() {
            config.args = self.args.clone();
        }

        config.backoff = self.resolve_backoff(config.backoff);

        config.validate()?;
        Ok(config)
    }

    fn resolve_backoff(&self, current: BackoffStrategy) -> BackoffStrategy {
        let current_cap = match current {
            BackoffStrategy::Exponential { max_delay_secs } => Some(max_delay_secs),
            BackoffStrategy::Fixed => None,
        };

        match (self.backoff, self.max_delay) {
            (Some(BackoffKind::Fixed), _) => BackoffStrategy::Fixed,
            (Some(BackoffKind::Exponential), cap) => BackoffStrategy::Exponential {
                max_delay_secs: cap.or(current_cap).unwrap_or(DEFAULT_MAX_DELAY_SECS),
            },
            (None, Some(cap)) if current_cap.is_some() => {
                BackoffStrategy::Exponential { max_delay_secs: cap }
            }
            _ => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["relaunch"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse(&[]).build_config().unwrap();

        assert_eq!(config.script, PathBuf::from("main.py"));
        assert_eq!(config.max_restarts, 50);
        assert_eq!(config.restart_delay_secs, 5);
        assert_eq!(config.log_file, PathBuf::from("restart_manager.log"));
        assert_eq!(config.backoff, BackoffStrategy::Fixed);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--script",
            "bot.py",
            "--max-restarts",
            "3",
            "--delay",
            "0",
            "--log-file",
            "custom.log",
            "--stop-timeout",
            "4",
        ])
        .build_config()
        .unwrap();

        assert_eq!(config.script, PathBuf::from("bot.py"));
        assert_eq!(config.max_restarts, 3);
        assert_eq!(config.restart_delay_secs, 0);
        assert_eq!(config.log_file, PathBuf::from("custom.log"));
        assert_eq!(config.stop_timeout_secs, 4);
    }

    #[test]
    fn test_test_mode_substitutes_script() {
        let config = parse(&["--script", "bot.py", "--test"])
            .build_config()
            .unwrap();

        assert_eq!(config.script, PathBuf::from(TEST_SCRIPT));
    }

    #[test]
    fn test_trailing_args_forwarded() {
        let config = parse(&["--script", "bot.py", "--", "--verbose", "guild"])
            .build_config()
            .unwrap();

        assert_eq!(config.args, vec!["--verbose", "guild"]);
    }

    #[test]
    fn test_exponential_backoff_flags() {
        let config = parse(&["--backoff", "exponential", "--max-delay", "60"])
            .build_config()
            .unwrap();
        assert_eq!(
            config.backoff,
            BackoffStrategy::Exponential { max_delay_secs: 60 }
        );

        let config = parse(&["--backoff", "exponential"]).build_config().unwrap();
        assert_eq!(
            config.backoff,
            BackoffStrategy::Exponential {
                max_delay_secs: DEFAULT_MAX_DELAY_SECS
            }
        );
    }

    #[test]
    fn test_max_delay_alone_keeps_fixed() {
        let config = parse(&["--max-delay", "60"]).build_config().unwrap();
        assert_eq!(config.backoff, BackoffStrategy::Fixed);
    }

    #[test]
    fn test_config_file_then_flags() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("relaunch.toml");
        fs::write(
            &config_path,
            r#"
                script = "worker.py"
                max_restarts = 7
                restart_delay_secs = 2
            "#,
        )
        .unwrap();

        let config_arg = config_path.to_str().unwrap();
        let config = parse(&["--config", config_arg, "--delay", "9"])
            .build_config()
            .unwrap();

        assert_eq!(config.script, PathBuf::from("worker.py"));
        assert_eq!(config.max_restarts, 7);
        assert_eq!(config.restart_delay_secs, 9);
    }

    #[test]
    fn test_flags_can_repair_config_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("relaunch.toml");
        fs::write(
            &config_path,
            r#"
                restart_delay_secs = 30

                [backoff]
                type = "exponential"
                max_delay_secs = 10
            "#,
        )
        .unwrap();

        let config_arg = config_path.to_str().unwrap();

        let result = parse(&["--config", config_arg]).build_config();
        assert!(matches!(
            result,
            Err(RelaunchError::ConfigValidationError(_))
        ));

        let config = parse(&["--config", config_arg, "--delay", "5"])
            .build_config()
            .unwrap();
        assert_eq!(config.restart_delay_secs, 5);
        assert_eq!(
            config.backoff,
            BackoffStrategy::Exponential { max_delay_secs: 10 }
        );
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let result = parse(&["--stop-timeout", "0"]).build_config();
        assert!(matches!(
            result,
            Err(RelaunchError::ConfigValidationError(_))
        ));
    }
}
