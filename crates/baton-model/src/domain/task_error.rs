use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error reported by a single task.
///
/// Any task error is terminal for the run it belongs to; it is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskError {
    #[error("task failed: {reason}")]
    Fail { reason: String },
    #[error("task panicked: {reason}")]
    Panicked { reason: String },
}

impl TaskError {
    pub fn fail(reason: impl Into<String>) -> Self {
        TaskError::Fail {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            TaskError::Fail { reason } | TaskError::Panicked { reason } => reason,
        }
    }
}
