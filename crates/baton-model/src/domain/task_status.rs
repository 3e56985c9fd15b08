use serde::{Deserialize, Serialize};

/// Execution state of one task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Submitted, not dispatched yet.
    Pending,
    /// Currently executing on a worker.
    Running,
    /// Finished without error.
    Succeeded,
    /// Returned an error or panicked.
    Failed,
    /// Never dispatched because the run ended first.
    Skipped,
}

impl TaskStatus {
    /// Returns `true` if the task will not transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Returns `true` if the task is still pending or running.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}
