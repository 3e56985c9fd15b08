use serde::{Deserialize, Serialize};

use crate::{ElapsedMs, TaskIndex, TaskStatus};

/// What happened to one submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Submission position.
    pub index: TaskIndex,
    /// Task name as reported by the task itself.
    pub name: String,
    pub status: TaskStatus,
    /// Worker that executed the task, once dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<usize>,
    /// Execution time, once finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<ElapsedMs>,
    /// Error message if the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn pending(index: TaskIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            status: TaskStatus::Pending,
            worker: None,
            elapsed_ms: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_record_omits_optional_fields() {
        let rec = TaskRecord::pending(0, "warmup");
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"index":0,"name":"warmup","status":"pending"}"#);
    }
}
