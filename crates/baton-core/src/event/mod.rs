//! Run lifecycle events and their delivery to subscribers.

mod bus;
pub use bus::{Bus, Subscribe};

use std::time::{Duration, SystemTime};

use baton_model::{RunId, TaskIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Run accepted; workers are about to be spawned.
    RunStarted,
    /// A worker picked up a task.
    TaskStarting,
    /// A task finished without error.
    TaskSucceeded,
    /// A task returned an error or panicked.
    TaskFailed,
    /// The deadline elapsed before the run finished.
    DeadlineHit,
    /// The cancellation source fired before the run finished.
    CancelObserved,
    /// Every task finished without error.
    RunCompleted,
    /// The run ended because a task failed.
    RunFailed,
}

impl EventKind {
    /// Returns `true` for the events that carry the run outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::DeadlineHit
                | EventKind::CancelObserved
                | EventKind::RunCompleted
                | EventKind::RunFailed
        )
    }
}

/// Something that happened during a run.
#[derive(Debug, Clone)]
pub struct Event {
    pub run: RunId,
    pub kind: EventKind,
    pub at: SystemTime,
    pub task: Option<String>,
    pub index: Option<TaskIndex>,
    pub worker: Option<usize>,
    pub reason: Option<String>,
    pub elapsed_ms: Option<u64>,
}

impl Event {
    pub fn new(run: &RunId, kind: EventKind) -> Self {
        Self {
            run: run.clone(),
            kind,
            at: SystemTime::now(),
            task: None,
            index: None,
            worker: None,
            reason: None,
            elapsed_ms: None,
        }
    }

    pub fn with_task(mut self, index: TaskIndex, name: impl Into<String>) -> Self {
        self.index = Some(index);
        self.task = Some(name.into());
        self
    }

    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
