//! The bounded task runner.
//!
//! A run races three events and the first one to become ready decides the
//! outcome:
//! - the worker pool drained the task list (`Completed`) or a task failed (`Failed`),
//! - the deadline elapsed (`TimedOut`),
//! - the cancel source fired (`Cancelled`).
//!
//! Once an outcome is chosen no further task is dispatched. Tasks already
//! executing keep running in the background and are not awaited.

mod pool;

use std::{
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use baton_model::{ConfigError, RunId, RunOutcome, RunReport, RunnerConfig};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::{
    cancel::CancelSource,
    error::RunnerError,
    event::{Bus, Event, EventKind, Subscribe},
    ledger::RunLedger,
    task::TaskRef,
};
use pool::{Pool, WorkerExit};

/// Stand-in deadline when `start + deadline` does not fit an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

pub struct Runner {
    id: RunId,
    tasks: Vec<TaskRef>,
    config: RunnerConfig,
    cancel: CancelSource,
    subscribers: Vec<Arc<dyn Subscribe>>,
    ledger: RunLedger,
    started: AtomicBool,
    events: OnceLock<Bus>,
    report: Mutex<Option<RunReport>>,
}

impl Runner {
    /// Create a runner over `tasks`.
    ///
    /// Fails if the config has no workers or a zero deadline.
    pub fn new(
        tasks: impl IntoIterator<Item = TaskRef>,
        config: RunnerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: RunId::from(uuid::Uuid::new_v4().to_string()),
            tasks: tasks.into_iter().collect(),
            config,
            cancel: CancelSource::new(),
            subscribers: Vec::new(),
            ledger: RunLedger::new(),
            started: AtomicBool::new(false),
            events: OnceLock::new(),
            report: Mutex::new(None),
        })
    }

    /// Use `cancel` as the external cancellation source.
    pub fn with_cancel(mut self, cancel: CancelSource) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn with_id(mut self, id: impl Into<RunId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a task. Rejected once the runner has been started.
    pub fn add(&mut self, task: TaskRef) -> Result<(), RunnerError> {
        if self.is_started() {
            return Err(RunnerError::AlreadyStarted);
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Handle to the cancellation source observed by this runner.
    pub fn cancel_source(&self) -> CancelSource {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Live per-task state. Populated when the run starts; in-flight tasks keep
    /// updating it after the outcome has been returned.
    pub fn ledger(&self) -> RunLedger {
        self.ledger.clone()
    }

    /// Outcome and task records captured when the run ended.
    pub fn report(&self) -> Option<RunReport> {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until subscribers have handled every event published so far.
    ///
    /// Call before shutting the runtime down so the terminal event is not lost.
    pub async fn flush_events(&self) {
        if let Some(bus) = self.events.get() {
            bus.flush().await;
        }
    }

    /// Execute the task list and return the terminal outcome.
    ///
    /// A runner runs once; any further call returns [`RunnerError::AlreadyStarted`].
    #[instrument(
        level = "info",
        skip(self),
        fields(run = %self.id, tasks = self.tasks.len(), workers = self.config.workers)
    )]
    pub async fn start(&self) -> Result<RunOutcome, RunnerError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RunnerError::AlreadyStarted);
        }

        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.deadline)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let bus = self.events.get_or_init(|| Bus::new(&self.subscribers)).clone();
        self.ledger.reset(self.tasks.iter().map(|t| t.name()));

        let deadline_ms = u64::try_from(self.config.deadline.as_millis()).unwrap_or(u64::MAX);
        info!(deadline_ms, "run started");
        bus.publish(Event::new(&self.id, EventKind::RunStarted));

        let halt = self.cancel.child_token();
        let outcome = match self.cancel.signal() {
            Some(signal) => RunOutcome::Cancelled { signal },
            None => {
                let pool = Pool {
                    run: self.id.clone(),
                    tasks: self.tasks.iter().cloned().collect(),
                    cursor: Arc::new(AtomicUsize::new(0)),
                    ledger: self.ledger.clone(),
                    bus: bus.clone(),
                    halt: halt.clone(),
                    deadline,
                };
                self.race(&pool, deadline).await
            }
        };
        halt.cancel();

        let skipped = self.ledger.skip_pending();
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let event = Event::new(&self.id, terminal_kind(&outcome)).with_elapsed(elapsed);

        match &outcome {
            RunOutcome::Completed => {
                info!(elapsed_ms, "run completed");
                bus.publish(event);
            }
            RunOutcome::TimedOut => {
                warn!(elapsed_ms, skipped, "run timed out");
                bus.publish(event.with_reason("deadline exceeded"));
            }
            RunOutcome::Cancelled { signal } => {
                warn!(elapsed_ms, skipped, %signal, "run cancelled");
                bus.publish(event.with_reason(signal.to_string()));
            }
            RunOutcome::Failed { index, task, error } => {
                error!(elapsed_ms, skipped, index, task = %task, error = %error, "run failed");
                bus.publish(event.with_task(*index, task.clone()).with_reason(error.to_string()));
            }
        }

        *self.report.lock().unwrap_or_else(PoisonError::into_inner) = Some(RunReport {
            run_id: self.id.clone(),
            outcome: outcome.clone(),
            elapsed_ms,
            tasks: self.ledger.snapshot(),
        });
        Ok(outcome)
    }

    async fn race(&self, pool: &Pool, deadline: Instant) -> RunOutcome {
        let mut exits = pool.spawn(self.config.workers);

        // Resolves to `None` when workers stopped claiming because of the
        // deadline or cancellation; the matching arm below wins instead.
        let execution = async move {
            let mut halted = false;
            while let Some(exit) = exits.recv().await {
                match exit {
                    WorkerExit::Drained => {}
                    WorkerExit::Halted => halted = true,
                    WorkerExit::Failed { index, task, error } => {
                        return Some(RunOutcome::Failed { index, task, error });
                    }
                }
            }
            (!halted).then_some(RunOutcome::Completed)
        };

        tokio::select! {
            Some(outcome) = execution => outcome,
            _ = tokio::time::sleep_until(deadline) => RunOutcome::TimedOut,
            signal = self.cancel.cancelled() => RunOutcome::Cancelled { signal },
        }
    }
}

fn terminal_kind(outcome: &RunOutcome) -> EventKind {
    match outcome {
        RunOutcome::Completed => EventKind::RunCompleted,
        RunOutcome::TimedOut => EventKind::DeadlineHit,
        RunOutcome::Cancelled { .. } => EventKind::CancelObserved,
        RunOutcome::Failed { .. } => EventKind::RunFailed,
    }
}
