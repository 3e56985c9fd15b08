use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use baton_model::TaskError;
use tokio_util::sync::CancellationToken;

use super::{Task, TaskRef};

/// Task backed by a closure producing a future.
///
/// ```
/// use baton_core::{Task, TaskFn};
///
/// let task = TaskFn::arc("noop", |_ctx| async move { Ok(()) });
/// assert_eq!(task.name(), "noop");
/// ```
pub struct TaskFn<F> {
    name: String,
    f: F,
}

impl<F, Fut> TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Shorthand for `Arc::new(TaskFn::new(..))`.
    pub fn arc(name: impl Into<String>, f: F) -> TaskRef {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}
