use std::{process::ExitCode, sync::Arc, time::Duration};

use tracing::info;

use baton_core::{CancelSource, Runner, Subscribe, TaskFn, TaskRef};
use baton_model::{RunOutcome, RunnerConfig};
use baton_observe::{Journal, LoggerConfig, logger_init};

const DEADLINE: Duration = Duration::from_secs(5);

fn sleep_task(id: u64) -> TaskRef {
    TaskFn::arc(format!("sleep-{id}"), move |_ctx| async move {
        info!(task = id, "processing");
        tokio::time::sleep(Duration::from_secs(id)).await;
        Ok(())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // 1) Logger
    logger_init(&LoggerConfig::from_env()?)?;
    info!("starting work");

    // 2) Cancellation wired to Ctrl+C / SIGTERM
    let cancel = CancelSource::new();
    cancel.watch_os_signals();

    // 3) Runner: three tasks sleeping 0s, 1s and 2s, one after another
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Journal::new())];
    let runner = Runner::new((0..3).map(sleep_task), RunnerConfig::new(DEADLINE))?
        .with_cancel(cancel)
        .with_subscribers(subscribers);

    // 4) Run and map the outcome to an exit code
    let outcome = runner.start().await?;
    let code = match &outcome {
        RunOutcome::Completed => 0,
        RunOutcome::TimedOut => 1,
        RunOutcome::Cancelled { .. } => 2,
        RunOutcome::Failed { .. } => 3,
    };
    runner.flush_events().await;
    info!(%outcome, "process ended");
    Ok(ExitCode::from(code))
}
