//! Bounded task runner with cooperative cancellation.
//!
//! A [`Runner`] executes a fixed list of [`Task`]s on a fixed number of workers
//! and races that execution against a one-shot deadline and an injected
//! [`CancelSource`]. Whichever finishes first decides the single [`RunOutcome`].
//!
//! ```no_run
//! use std::time::Duration;
//! use baton_core::{Runner, TaskFn};
//! use baton_model::RunnerConfig;
//!
//! # async fn demo() -> Result<(), baton_core::RunnerError> {
//! let tasks = vec![TaskFn::arc("warmup", |_ctx| async move { Ok(()) })];
//! let runner = Runner::new(tasks, RunnerConfig::new(Duration::from_secs(3)))?;
//! let outcome = runner.start().await?;
//! assert!(outcome.is_completed());
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::RunnerError;

pub mod cancel;
pub use cancel::CancelSource;

pub mod event;
pub use event::{Bus, Event, EventKind, Subscribe};

pub mod ledger;
pub use ledger::RunLedger;

pub mod runner;
pub use runner::Runner;

pub mod task;
pub use task::{Task, TaskFn, TaskRef};

pub use baton_model::{
    RunId, RunOutcome, RunReport, RunnerConfig, Signal, TaskError, TaskRecord, TaskStatus,
};
pub use tokio_util::sync::CancellationToken;
