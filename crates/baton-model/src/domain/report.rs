use serde::{Deserialize, Serialize};

use crate::{ElapsedMs, RunId, RunOutcome, TaskRecord, TaskStatus};

/// Outcome of a run together with per-task records in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    /// Time from start until the outcome was chosen.
    pub elapsed_ms: ElapsedMs,
    pub tasks: Vec<TaskRecord>,
}

impl RunReport {
    /// Number of tasks in the given state.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
