use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing::info;

use baton_core::{CancelSource, Runner, Subscribe, TaskFn, TaskRef};
use baton_model::{RunnerConfig, TaskStatus};
use baton_observe::{Journal, LoggerConfig, logger_init};

const TASKS: usize = 10;
/// Overrides the default config, e.g. `{"deadlineMs": 5000, "workers": 4}`.
const ENV_CONFIG: &str = "BATON_RUNNER";

fn job(id: usize) -> TaskRef {
    TaskFn::arc(format!("job-{id}"), move |_ctx| async move {
        info!(job = id, "started");
        tokio::time::sleep(Duration::from_secs(1)).await;
        info!(job = id, "finished");
        Ok(())
    })
}

fn config() -> anyhow::Result<RunnerConfig> {
    match std::env::var(ENV_CONFIG) {
        Ok(raw) => serde_json::from_str(&raw).with_context(|| format!("parse {ENV_CONFIG}")),
        Err(_) => Ok(RunnerConfig::new(Duration::from_secs(10)).with_workers(3)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig::from_env()?)?;

    let cfg = config()?;
    let deadline_ms = cfg.deadline.as_millis() as u64;
    info!(workers = cfg.workers, deadline_ms, "config loaded");

    let cancel = CancelSource::new();
    cancel.watch_os_signals();

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Journal::new())];
    let runner = Runner::new((0..TASKS).map(job), cfg)?
        .with_cancel(cancel)
        .with_subscribers(subscribers);

    let outcome = runner.start().await?;
    if let Some(report) = runner.report() {
        info!(
            %outcome,
            succeeded = report.count(TaskStatus::Succeeded),
            skipped = report.count(TaskStatus::Skipped),
            elapsed_ms = report.elapsed_ms,
            "all workers done"
        );
    }
    runner.flush_events().await;
    Ok(())
}
