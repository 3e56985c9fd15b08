//! # Units of work.
//!
//! - [`Task`] - trait for async tasks that may observe cancellation
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)

mod func;
pub use func::TaskFn;

use std::sync::Arc;

use async_trait::async_trait;
use baton_model::TaskError;
use tokio_util::sync::CancellationToken;

/// A named unit of work.
///
/// `ctx` is cancelled once the run stops dispatching (timeout, cancellation,
/// failure of another task or a chosen outcome). Observing it is optional: the
/// runner never aborts a task that is already executing.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

pub type TaskRef = Arc<dyn Task>;
