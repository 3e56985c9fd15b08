//! Per-task state of a run, indexed by submission position.
//!
//! The ledger doubles as the dispatch gate: a task is only executed if it can
//! be moved from `Pending` to `Running`, and [`RunLedger::skip_pending`] closes
//! that gate for everything still pending once the outcome is chosen.

use std::{
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use baton_model::{TaskError, TaskIndex, TaskRecord, TaskStatus};

/// In-memory task ledger.
#[derive(Clone, Default)]
pub struct RunLedger {
    inner: Arc<RwLock<Vec<TaskRecord>>>,
}

impl RunLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with one `Pending` record per name, in order.
    pub fn reset<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let mut inner = self.write();
        inner.clear();
        inner.extend(
            names
                .into_iter()
                .enumerate()
                .map(|(index, name)| TaskRecord::pending(index, name)),
        );
    }

    /// Claim a pending task for `worker`.
    ///
    /// Returns `false` if the task is unknown or no longer pending.
    pub fn mark_running(&self, index: TaskIndex, worker: usize) -> bool {
        let mut inner = self.write();
        match inner.get_mut(index) {
            Some(rec) if rec.status == TaskStatus::Pending => {
                rec.status = TaskStatus::Running;
                rec.worker = Some(worker);
                true
            }
            _ => false,
        }
    }

    pub fn mark_succeeded(&self, index: TaskIndex, elapsed: Duration) {
        self.finish(index, TaskStatus::Succeeded, elapsed, None);
    }

    pub fn mark_failed(&self, index: TaskIndex, elapsed: Duration, error: &TaskError) {
        self.finish(index, TaskStatus::Failed, elapsed, Some(error.to_string()));
    }

    /// Hand back a claim that was never dispatched: `Running` becomes `Skipped`.
    pub fn mark_skipped(&self, index: TaskIndex) {
        let mut inner = self.write();
        if let Some(rec) = inner.get_mut(index).filter(|rec| rec.status == TaskStatus::Running) {
            rec.status = TaskStatus::Skipped;
            rec.worker = None;
        }
    }

    /// Mark every still-pending task as `Skipped`; returns how many were skipped.
    pub fn skip_pending(&self) -> usize {
        let mut inner = self.write();
        let mut skipped = 0;
        for rec in inner.iter_mut().filter(|rec| rec.status == TaskStatus::Pending) {
            rec.status = TaskStatus::Skipped;
            skipped += 1;
        }
        skipped
    }

    /// Get a record by submission index.
    pub fn get(&self, index: TaskIndex) -> Option<TaskRecord> {
        self.read().get(index).cloned()
    }

    /// All records in submission order.
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.read().clone()
    }

    /// Records matching a status, in submission order.
    pub fn list_by_status(&self, status: TaskStatus) -> Vec<TaskRecord> {
        self.read()
            .iter()
            .filter(|rec| rec.status == status)
            .cloned()
            .collect()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.read().iter().filter(|rec| rec.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn finish(&self, index: TaskIndex, status: TaskStatus, elapsed: Duration, error: Option<String>) {
        let mut inner = self.write();
        if let Some(rec) = inner.get_mut(index) {
            rec.status = status;
            rec.elapsed_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
            rec.error = error;
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<TaskRecord>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TaskRecord>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(names: &[&str]) -> RunLedger {
        let ledger = RunLedger::new();
        ledger.reset(names.iter().copied());
        ledger
    }

    #[test]
    fn reset_registers_pending_in_order() {
        let ledger = ledger(&["a", "b", "c"]);
        let all = ledger.snapshot();

        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.status == TaskStatus::Pending));
        assert_eq!(
            all.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(all[1].name, "b");
    }

    #[test]
    fn mark_running_claims_once() {
        let ledger = ledger(&["a"]);

        assert!(ledger.mark_running(0, 3));
        assert!(!ledger.mark_running(0, 4));

        let rec = ledger.get(0).unwrap();
        assert_eq!(rec.status, TaskStatus::Running);
        assert_eq!(rec.worker, Some(3));
    }

    #[test]
    fn mark_running_unknown_index() {
        let ledger = ledger(&["a"]);
        assert!(!ledger.mark_running(7, 0));
    }

    #[test]
    fn finish_records_elapsed_and_error() {
        let ledger = ledger(&["a", "b"]);
        ledger.mark_running(0, 0);
        ledger.mark_running(1, 0);

        ledger.mark_succeeded(0, Duration::from_millis(12));
        ledger.mark_failed(1, Duration::from_millis(5), &TaskError::fail("disk full"));

        let ok = ledger.get(0).unwrap();
        assert_eq!(ok.status, TaskStatus::Succeeded);
        assert_eq!(ok.elapsed_ms, Some(12));
        assert!(ok.error.is_none());

        let bad = ledger.get(1).unwrap();
        assert_eq!(bad.status, TaskStatus::Failed);
        assert_eq!(bad.error.as_deref(), Some("task failed: disk full"));
    }

    #[test]
    fn skip_pending_closes_the_gate() {
        let ledger = ledger(&["a", "b", "c"]);
        ledger.mark_running(0, 0);

        assert_eq!(ledger.skip_pending(), 2);
        assert!(!ledger.mark_running(1, 0));

        assert_eq!(ledger.count(TaskStatus::Skipped), 2);
        assert_eq!(ledger.count(TaskStatus::Running), 1);
    }

    #[test]
    fn mark_skipped_only_releases_running_claims() {
        let ledger = ledger(&["a", "b"]);
        ledger.mark_running(0, 2);
        ledger.mark_running(1, 2);
        ledger.mark_succeeded(1, Duration::from_millis(1));

        ledger.mark_skipped(0);
        ledger.mark_skipped(1);

        let released = ledger.get(0).unwrap();
        assert_eq!(released.status, TaskStatus::Skipped);
        assert_eq!(released.worker, None);
        assert_eq!(ledger.get(1).unwrap().status, TaskStatus::Succeeded);
        assert!(!ledger.mark_running(0, 0));
    }

    #[test]
    fn list_by_status_keeps_submission_order() {
        let ledger = ledger(&["a", "b", "c", "d"]);
        ledger.mark_running(3, 1);
        ledger.mark_running(1, 0);

        let running = ledger.list_by_status(TaskStatus::Running);
        assert_eq!(
            running.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }
}
