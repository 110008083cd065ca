use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Restart policy for a supervisor session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Maximum number of restarts allowed in the session
    pub max_restarts: usize,
    /// Delay before the first restart (in seconds)
    pub initial_delay_secs: u64,
    /// Backoff strategy to use
    pub backoff_strategy: BackoffStrategy,
}

impl RestartPolicy {
    pub fn new(max_restarts: usize, initial_delay_secs: u64, backoff_strategy: BackoffStrategy) -> Self {
        Self {
            max_restarts,
            initial_delay_secs,
            backoff_strategy,
        }
    }

    /// Whether another restart fits in the budget after `restart_count` restarts
    pub fn should_restart(&self, restart_count: usize) -> bool {
        restart_count < self.max_restarts
    }

    /// Delay to wait before the restart that follows `restart_count` completed restarts
    pub fn calculate_delay(&self, restart_count: usize) -> Duration {
        self.backoff_strategy
            .calculate_delay(self.initial_delay_secs, restart_count)
    }
}

/// Backoff strategy for restart delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Fixed delay between restarts
    #[default]
    Fixed,
    /// Exponential backoff with maximum delay
    Exponential { max_delay_secs: u64 },
}

impl BackoffStrategy {
    /// Calculate the delay for a given restart attempt
    pub fn calculate_delay(&self, initial_delay_secs: u64, restart_count: usize) -> Duration {
        match self {
            BackoffStrategy::Fixed => Duration::from_secs(initial_delay_secs),
            BackoffStrategy::Exponential { max_delay_secs } => {
                // delay = initial * 2^restart_count, never below the configured delay
                let exponent = u32::try_from(restart_count).unwrap_or(u32::MAX);
                let delay_secs = initial_delay_secs
                    .saturating_mul(2_u64.saturating_pow(exponent))
                    .min(*max_delay_secs)
                    .max(initial_delay_secs);
                Duration::from_secs(delay_secs)
            }
        }
    }
}

impl std::fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffStrategy::Fixed => write!(f, "fixed"),
            BackoffStrategy::Exponential { max_delay_secs } => {
                write!(f, "exponential (max {}s)", max_delay_secs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_policy_budget() {
        let policy = RestartPolicy::new(3, 1, BackoffStrategy::Fixed);

        assert!(policy.should_restart(0));
        assert!(policy.should_restart(2));
        // Budget exhausted once the count reaches the limit
        assert!(!policy.should_restart(3));
        assert!(!policy.should_restart(4));
    }

    #[test]
    fn test_restart_policy_zero_budget() {
        let policy = RestartPolicy::new(0, 5, BackoffStrategy::Fixed);
        assert!(!policy.should_restart(0));
    }

    #[test]
    fn test_backoff_fixed() {
        let strategy = BackoffStrategy::Fixed;
        assert_eq!(strategy.calculate_delay(5, 0), Duration::from_secs(5));
        assert_eq!(strategy.calculate_delay(5, 1), Duration::from_secs(5));
        assert_eq!(strategy.calculate_delay(5, 10), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_exponential() {
        let strategy = BackoffStrategy::Exponential { max_delay_secs: 60 };

        assert_eq!(strategy.calculate_delay(1, 0), Duration::from_secs(1));
        assert_eq!(strategy.calculate_delay(1, 1), Duration::from_secs(2));
        assert_eq!(strategy.calculate_delay(1, 3), Duration::from_secs(8));
        // 1 * 2^6 = 64, capped at 60
        assert_eq!(strategy.calculate_delay(1, 6), Duration::from_secs(60));
        assert_eq!(strategy.calculate_delay(1, 1000), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_exponential_never_below_initial() {
        let strategy = BackoffStrategy::Exponential { max_delay_secs: 2 };
        assert_eq!(strategy.calculate_delay(5, 0), Duration::from_secs(5));
        assert_eq!(strategy.calculate_delay(5, 4), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_zero_delay() {
        let strategy = BackoffStrategy::Exponential { max_delay_secs: 60 };
        assert_eq!(strategy.calculate_delay(0, 5), Duration::ZERO);
    }

    #[test]
    fn test_calculate_delay_integration() {
        let policy = RestartPolicy::new(10, 1, BackoffStrategy::Exponential { max_delay_secs: 60 });

        assert_eq!(policy.calculate_delay(0), Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(1), Duration::from_secs(2));
        assert_eq!(policy.calculate_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_display() {
        assert_eq!(BackoffStrategy::Fixed.to_string(), "fixed");
        assert_eq!(
            BackoffStrategy::Exponential { max_delay_secs: 30 }.to_string(),
            "exponential (max 30s)"
        );
    }
}
