use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Signal, TaskError, TaskIndex};

/// Terminal result of a run.
///
/// A run produces exactly one outcome. Tasks that finished before a timeout or
/// cancellation are visible in the report, not in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RunOutcome {
    /// Every task executed without error.
    Completed,
    /// The deadline elapsed first.
    TimedOut,
    /// The cancellation source fired first.
    Cancelled { signal: Signal },
    /// A task returned an error; no further tasks were dispatched.
    Failed {
        index: TaskIndex,
        task: String,
        error: TaskError,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Short symbolic identifier, intended for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::TimedOut => "timeout",
            RunOutcome::Cancelled { .. } => "cancelled",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::TimedOut => f.write_str("timed out"),
            RunOutcome::Cancelled { signal } => write!(f, "cancelled ({signal})"),
            RunOutcome::Failed { index, task, error } => {
                write!(f, "failed at #{index} ({task}): {error}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(RunOutcome::Completed.kind(), "completed");
        assert_eq!(RunOutcome::TimedOut.kind(), "timeout");
        assert_eq!(
            RunOutcome::Cancelled {
                signal: Signal::Interrupt
            }
            .kind(),
            "cancelled"
        );
    }

    #[test]
    fn failed_display_names_task() {
        let outcome = RunOutcome::Failed {
            index: 2,
            task: "fetch".into(),
            error: TaskError::fail("connection refused"),
        };
        assert_eq!(
            outcome.to_string(),
            "failed at #2 (fetch): task failed: connection refused"
        );
        assert!(!outcome.is_completed());
    }

    #[test]
    fn cancelled_serializes_with_tag() {
        let outcome = RunOutcome::Cancelled {
            signal: Signal::requested("shutdown"),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"cancelled","signal":{"requested":"shutdown"}}"#
        );
    }
}
