mod config;
pub use config::{ConfigError, RunnerConfig};

mod signal;
pub use signal::Signal;

mod task_error;
pub use task_error::TaskError;

mod outcome;
pub use outcome::RunOutcome;

mod task_status;
pub use task_status::TaskStatus;

mod task_record;
pub use task_record::TaskRecord;

mod run_id;
pub use run_id::RunId;

mod report;
pub use report::RunReport;

pub(crate) mod duration_ms;

/// Submission position of a task inside a run (0-based).
pub type TaskIndex = usize;

/// Elapsed time in milliseconds.
///
/// Used in records and reports where a serializable duration is required.
pub type ElapsedMs = u64;
