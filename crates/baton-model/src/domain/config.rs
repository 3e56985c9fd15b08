use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_WORKERS: usize = 1;

/// Invalid runner construction parameters.
///
/// Always reported before any task is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("deadline must be greater than zero")]
    ZeroDeadline,
}

/// Execution limits of a single run.
///
/// `workers == 1` executes tasks sequentially in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// One-shot wall-clock budget for the whole run, armed when the run starts.
    #[serde(rename = "deadlineMs", with = "crate::domain::duration_ms")]
    pub deadline: Duration,
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl RunnerConfig {
    /// Sequential configuration with the given deadline.
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns `true` when tasks are executed one after another.
    #[inline]
    pub fn is_sequential(&self) -> bool {
        self.workers == 1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers < 1 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_sequential() {
        let cfg = RunnerConfig::new(Duration::from_secs(1));
        assert!(cfg.is_sequential());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = RunnerConfig::new(Duration::from_secs(1)).with_workers(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn zero_deadline_rejected() {
        let cfg = RunnerConfig::new(Duration::ZERO).with_workers(4);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDeadline));
    }

    #[test]
    fn deserialize_from_millis() {
        let cfg: RunnerConfig = serde_json::from_str(r#"{"deadlineMs":1500,"workers":3}"#).unwrap();
        assert_eq!(cfg.deadline, Duration::from_millis(1500));
        assert_eq!(cfg.workers, 3);
    }

    #[test]
    fn workers_default_to_one() {
        let cfg: RunnerConfig = serde_json::from_str(r#"{"deadlineMs":250}"#).unwrap();
        assert_eq!(cfg.workers, 1);

        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"deadlineMs":250,"workers":1}"#);
    }
}
