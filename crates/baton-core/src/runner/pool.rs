use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use baton_model::{RunId, TaskError, TaskIndex};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, trace};

use crate::{
    event::{Bus, Event, EventKind},
    ledger::RunLedger,
    task::TaskRef,
};

/// Why a worker loop returned.
#[derive(Debug)]
pub(crate) enum WorkerExit {
    /// No task left to claim.
    Drained,
    /// Stopped claiming because the run was halted or the deadline passed.
    Halted,
    /// The last task this worker ran failed.
    Failed {
        index: TaskIndex,
        task: String,
        error: TaskError,
    },
}

/// Shared state of the workers of one run.
#[derive(Clone)]
pub(crate) struct Pool {
    pub(crate) run: RunId,
    pub(crate) tasks: Arc<[TaskRef]>,
    pub(crate) cursor: Arc<AtomicUsize>,
    pub(crate) ledger: RunLedger,
    pub(crate) bus: Bus,
    pub(crate) halt: CancellationToken,
    pub(crate) deadline: Instant,
}

impl Pool {
    /// Spawn `workers` detached worker loops.
    ///
    /// Every worker reports exactly one [`WorkerExit`] on the returned channel.
    /// Workers keep running if the receiver is dropped.
    pub(crate) fn spawn(&self, workers: usize) -> mpsc::Receiver<WorkerExit> {
        let (tx, rx) = mpsc::channel(workers.max(1));
        for worker in 0..workers {
            let pool = self.clone();
            let tx = tx.clone();
            tokio::spawn(
                async move {
                    let exit = pool.work(worker).await;
                    trace!(worker, ?exit, "worker exited");
                    let _ = tx.send(exit).await;
                }
                .instrument(Span::current()),
            );
        }
        rx
    }

    async fn work(&self, worker: usize) -> WorkerExit {
        loop {
            let index = self.cursor.fetch_add(1, Ordering::AcqRel);
            let Some(task) = self.tasks.get(index) else {
                return WorkerExit::Drained;
            };
            if !self.ledger.mark_running(index, worker) {
                return WorkerExit::Halted;
            }
            // Checked after the claim: a halt raised while claiming hands the
            // task back instead of dispatching it.
            if self.halt.is_cancelled() || Instant::now() >= self.deadline {
                self.ledger.mark_skipped(index);
                return WorkerExit::Halted;
            }

            let name = task.name().to_string();
            debug!(worker, index, task = %name, "dispatching task");
            self.bus.publish(
                Event::new(&self.run, EventKind::TaskStarting)
                    .with_task(index, name.clone())
                    .with_worker(worker),
            );

            let started = Instant::now();
            let result = run_guarded(Arc::clone(task), self.halt.child_token()).await;
            let elapsed = started.elapsed();

            match result {
                Ok(()) => {
                    self.ledger.mark_succeeded(index, elapsed);
                    let elapsed_ms = elapsed.as_millis() as u64;
                    debug!(worker, index, task = %name, elapsed_ms, "task succeeded");
                    self.bus.publish(
                        Event::new(&self.run, EventKind::TaskSucceeded)
                            .with_task(index, name)
                            .with_worker(worker)
                            .with_elapsed(elapsed),
                    );
                }
                Err(err) => {
                    self.ledger.mark_failed(index, elapsed, &err);
                    self.halt.cancel();
                    error!(worker, index, task = %name, error = %err, "task failed");
                    self.bus.publish(
                        Event::new(&self.run, EventKind::TaskFailed)
                            .with_task(index, name.clone())
                            .with_worker(worker)
                            .with_reason(err.to_string())
                            .with_elapsed(elapsed),
                    );
                    return WorkerExit::Failed {
                        index,
                        task: name,
                        error: err,
                    };
                }
            }
        }
    }
}

/// Run a task on its own tokio task so a panic surfaces as [`TaskError::Panicked`].
async fn run_guarded(task: TaskRef, ctx: CancellationToken) -> Result<(), TaskError> {
    match tokio::spawn(async move { task.run(ctx).await }).await {
        Ok(result) => result,
        Err(join) if join.is_panic() => Err(TaskError::Panicked {
            reason: panic_reason(join.into_panic()),
        }),
        Err(join) => Err(TaskError::Panicked {
            reason: join.to_string(),
        }),
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use baton_model::TaskStatus;

    use super::*;
    use crate::task::TaskFn;

    fn counting(ran: &Arc<AtomicUsize>, n: usize) -> Arc<[TaskRef]> {
        (0..n)
            .map(|i| {
                let ran = Arc::clone(ran);
                TaskFn::arc(format!("task-{i}"), move |_ctx| {
                    let ran = Arc::clone(&ran);
                    async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
            })
            .collect()
    }

    fn pool(tasks: Arc<[TaskRef]>, halt: CancellationToken) -> Pool {
        let ledger = RunLedger::new();
        ledger.reset(tasks.iter().map(|t| t.name()));
        Pool {
            run: RunId::from("run"),
            tasks,
            cursor: Arc::new(AtomicUsize::new(0)),
            ledger,
            bus: Bus::default(),
            halt,
            deadline: Instant::now() + Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn worker_drains_every_task() {
        let ran = Arc::new(AtomicUsize::new(0));
        let pool = pool(counting(&ran, 3), CancellationToken::new());

        assert!(matches!(pool.work(0).await, WorkerExit::Drained));
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(pool.ledger.count(TaskStatus::Succeeded), 3);
    }

    #[tokio::test]
    async fn halted_worker_hands_its_claim_back() {
        let ran = Arc::new(AtomicUsize::new(0));
        let halt = CancellationToken::new();
        halt.cancel();
        let pool = pool(counting(&ran, 2), halt);

        assert!(matches!(pool.work(1).await, WorkerExit::Halted));
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        let claimed = pool.ledger.get(0).unwrap();
        assert_eq!(claimed.status, TaskStatus::Skipped);
        assert_eq!(claimed.worker, None);
        assert_eq!(pool.ledger.get(1).unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn halt_raised_by_a_failure_stops_the_other_worker() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut tasks: Vec<TaskRef> = counting(&ran, 4).iter().cloned().collect();
        tasks[0] = TaskFn::arc("broken", |_ctx| async move { Err(TaskError::fail("nope")) });
        let pool = pool(tasks.into(), CancellationToken::new());

        assert!(matches!(
            pool.work(0).await,
            WorkerExit::Failed { index: 0, .. }
        ));
        assert!(matches!(pool.work(1).await, WorkerExit::Halted));

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(pool.ledger.get(1).unwrap().status, TaskStatus::Skipped);
        assert_eq!(pool.ledger.count(TaskStatus::Pending), 2);
    }
}
