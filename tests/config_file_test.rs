// Integration test for configuration file support

use relaunch::config::SupervisorConfig;
use relaunch::error::RelaunchError;
use relaunch::process::BackoffStrategy;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.toml");

    let toml_content = r#"
        script = "bot.py"
        interpreter = "python3.11"
        args = ["--shard", "0"]
        max_restarts = 5
        restart_delay_secs = 2
        log_file = "logs/bot.log"
        stats_file = "logs/bot_stats.json"
        stop_signal = "SIGINT"
        stop_timeout_secs = 15

        [env]
        BOT_ENV = "production"

        [backoff]
        type = "exponential"
        max_delay_secs = 120
    "#;

    fs::write(&config_path, toml_content).unwrap();

    let config = SupervisorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.script, PathBuf::from("bot.py"));
    assert_eq!(config.interpreter.as_deref(), Some("python3.11"));
    assert_eq!(config.args, vec!["--shard", "0"]);
    assert_eq!(config.max_restarts, 5);
    assert_eq!(config.restart_delay_secs, 2);
    assert_eq!(config.log_file, PathBuf::from("logs/bot.log"));
    assert_eq!(config.stats_file, PathBuf::from("logs/bot_stats.json"));
    assert_eq!(config.stop_signal, "SIGINT");
    assert_eq!(config.stop_timeout_secs, 15);
    assert_eq!(config.env.get("BOT_ENV"), Some(&"production".to_string()));
    assert_eq!(
        config.backoff,
        BackoffStrategy::Exponential { max_delay_secs: 120 }
    );
}

#[test]
fn test_load_json_config_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.json");

    fs::write(&config_path, r#"{ "script": "index.js", "max_restarts": 3 }"#).unwrap();

    let config = SupervisorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.script, PathBuf::from("index.js"));
    assert_eq!(config.max_restarts, 3);
    assert_eq!(config.restart_delay_secs, 5);
    assert_eq!(config.log_file, PathBuf::from("restart_manager.log"));
    assert_eq!(config.stats_file, PathBuf::from("restart_stats.json"));
    assert_eq!(config.backoff, BackoffStrategy::Fixed);
}

#[test]
fn test_empty_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.toml");
    fs::write(&config_path, "").unwrap();

    let config = SupervisorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.script, PathBuf::from("main.py"));
    assert_eq!(config.max_restarts, 50);
}

#[test]
fn test_config_env_expansion() {
    std::env::set_var("RELAUNCH_CONFIG_TEST_DIR", "/srv/bot");

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.toml");
    fs::write(&config_path, r#"script = "${RELAUNCH_CONFIG_TEST_DIR}/main.py""#).unwrap();

    let config = SupervisorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.script, PathBuf::from("/srv/bot/main.py"));
}

#[test]
fn test_invalid_toml_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.toml");
    fs::write(&config_path, "max_restarts = \"lots\"").unwrap();

    let result = SupervisorConfig::from_file(&config_path);
    assert!(matches!(result, Err(RelaunchError::InvalidConfig(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("relaunch.toml");
    fs::write(&config_path, "stop_signal = \"SIGSTOP\"").unwrap();

    // Loading defers validation until CLI overrides are merged
    let config = SupervisorConfig::from_file(&config_path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(RelaunchError::ConfigValidationError(_))
    ));
}

#[test]
fn test_missing_config_file() {
    let result = SupervisorConfig::from_file(&PathBuf::from("/nonexistent/relaunch.toml"));
    assert!(matches!(result, Err(RelaunchError::ConfigError(_))));
}
