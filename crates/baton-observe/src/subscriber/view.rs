use std::borrow::Borrow;

use baton_core::{Event, EventKind};
use tracing::{debug, error, info, trace, warn};

/// Accessors with log-friendly defaults for optional event fields.
pub trait View {
    fn as_run(&self) -> &str;
    fn as_task(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn index(&self) -> usize;
    fn worker(&self) -> usize;
    fn elapsed_ms(&self) -> u64;
    fn kind(&self) -> EventKind;
}

impl<T> View for T
where
    T: Borrow<Event>,
{
    #[inline]
    fn as_run(&self) -> &str {
        self.borrow().run.as_str()
    }
    #[inline]
    fn as_task(&self) -> &str {
        self.borrow().task.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn index(&self) -> usize {
        self.borrow().index.unwrap_or(0)
    }
    #[inline]
    fn worker(&self) -> usize {
        self.borrow().worker.unwrap_or(0)
    }
    #[inline]
    fn elapsed_ms(&self) -> u64 {
        self.borrow().elapsed_ms.unwrap_or(0)
    }
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // lifecycle
        EventKind::RunStarted => "run started",
        EventKind::TaskStarting => "task is starting",
        EventKind::TaskSucceeded => "task finished",
        EventKind::TaskFailed => "task failed; no further tasks will be dispatched",

        // terminal
        EventKind::RunCompleted => "all tasks completed",
        EventKind::RunFailed => "run failed",
        EventKind::DeadlineHit => "run exceeded its deadline",
        EventKind::CancelObserved => "run cancelled",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // lifecycle
        EventKind::RunStarted => debug!(run = e.as_run(), "{msg}"),
        EventKind::TaskStarting => trace!(
            run = e.as_run(),
            task = e.as_task(),
            index = e.index(),
            worker = e.worker(),
            "{msg}"
        ),
        EventKind::TaskSucceeded => debug!(
            run = e.as_run(),
            task = e.as_task(),
            index = e.index(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::TaskFailed => error!(
            run = e.as_run(),
            task = e.as_task(),
            index = e.index(),
            reason = e.as_reason(),
            "{msg}"
        ),

        // terminal
        EventKind::RunCompleted => {
            info!(run = e.as_run(), elapsed_ms = e.elapsed_ms(), "{msg}")
        }
        EventKind::RunFailed => error!(
            run = e.as_run(),
            task = e.as_task(),
            reason = e.as_reason(),
            "{msg}"
        ),
        EventKind::DeadlineHit => {
            warn!(run = e.as_run(), elapsed_ms = e.elapsed_ms(), "{msg}")
        }
        EventKind::CancelObserved => {
            warn!(run = e.as_run(), reason = e.as_reason(), "{msg}")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use baton_core::{Event, RunId};

    use super::*;

    #[test]
    fn view_defaults_for_missing_fields() {
        let ev = Event::new(&RunId::from("run-7"), EventKind::RunStarted);
        assert_eq!(ev.as_run(), "run-7");
        assert_eq!(ev.as_task(), "unknown");
        assert_eq!(ev.as_reason(), "unknown");
        assert_eq!(ev.elapsed_ms(), 0);
    }

    #[test]
    fn view_reads_task_fields() {
        let ev = Event::new(&RunId::from("run"), EventKind::TaskSucceeded)
            .with_task(4, "compress")
            .with_worker(2)
            .with_elapsed(Duration::from_millis(31));
        assert_eq!(ev.as_task(), "compress");
        assert_eq!(ev.index(), 4);
        assert_eq!(ev.worker(), 2);
        assert_eq!(ev.elapsed_ms(), 31);
    }

    #[test]
    fn terminal_events_have_messages() {
        for kind in [
            EventKind::RunCompleted,
            EventKind::RunFailed,
            EventKind::DeadlineHit,
            EventKind::CancelObserved,
        ] {
            assert!(kind.is_terminal());
            assert!(!message_for(kind).is_empty());
        }
    }
}
