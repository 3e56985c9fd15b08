//! Injected cancellation source.
//!
//! Replaces process-wide signal handling: the caller owns a [`CancelSource`],
//! hands a clone to the runner and fires it from wherever the stop request
//! originates (OS signal watcher, another task, a test).

use std::sync::{Arc, OnceLock};

use baton_model::Signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone, Default)]
pub struct CancelSource {
    token: CancellationToken,
    signal: Arc<OnceLock<Signal>>,
}

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the source. Only the first signal is kept; returns `false` if the
    /// source had already been cancelled.
    pub fn cancel(&self, signal: Signal) -> bool {
        let first = self.signal.set(signal).is_ok();
        if first {
            debug!(signal = ?self.signal.get(), "cancel source fired");
            self.token.cancel();
        }
        first
    }

    /// Signal recorded by the first `cancel` call.
    pub fn signal(&self) -> Option<Signal> {
        self.signal.get().cloned()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the source fires.
    pub async fn cancelled(&self) -> Signal {
        self.token.cancelled().await;
        self.signal()
            .unwrap_or_else(|| Signal::requested("cancelled"))
    }

    /// Token cancelled together with this source; cancelling the child does
    /// not fire the source.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Spawn a watcher that fires the source on Ctrl+C (and `SIGTERM` on unix).
    ///
    /// Signal handlers are installed before this returns. The watcher exits on
    /// its own once the source is cancelled by anything else.
    #[cfg(feature = "os-signal")]
    pub fn watch_os_signals(&self) -> tokio::task::JoinHandle<()> {
        let source = self.clone();
        let listener = os::Listener::install();
        tokio::spawn(async move {
            tokio::select! {
                signal = listener.recv() => match signal {
                    Some(signal) => {
                        tracing::info!(%signal, "os signal received");
                        source.cancel(signal);
                    }
                    None => tracing::warn!("os signal listener failed; cancellation by signal disabled"),
                },
                _ = source.token.cancelled() => debug!("os signal watcher stopped"),
            }
        })
    }
}

#[cfg(feature = "os-signal")]
mod os {
    use baton_model::Signal;

    #[cfg(unix)]
    pub(super) struct Listener {
        interrupt: Option<tokio::signal::unix::Signal>,
        terminate: Option<tokio::signal::unix::Signal>,
    }

    #[cfg(unix)]
    impl Listener {
        pub(super) fn install() -> Self {
            use tokio::signal::unix::SignalKind;

            Self {
                interrupt: listen(SignalKind::interrupt()),
                terminate: listen(SignalKind::terminate()),
            }
        }

        pub(super) async fn recv(mut self) -> Option<Signal> {
            tokio::select! {
                Some(()) = next(&mut self.interrupt) => Some(Signal::Interrupt),
                Some(()) = next(&mut self.terminate) => Some(Signal::Terminate),
                else => None,
            }
        }
    }

    #[cfg(unix)]
    fn listen(kind: tokio::signal::unix::SignalKind) -> Option<tokio::signal::unix::Signal> {
        tokio::signal::unix::signal(kind)
            .inspect_err(|e| tracing::warn!(error = %e, ?kind, "signal listener unavailable"))
            .ok()
    }

    #[cfg(unix)]
    async fn next(sig: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
        match sig {
            Some(sig) => sig.recv().await,
            None => None,
        }
    }

    #[cfg(not(unix))]
    pub(super) struct Listener;

    #[cfg(not(unix))]
    impl Listener {
        pub(super) fn install() -> Self {
            Self
        }

        pub(super) async fn recv(self) -> Option<Signal> {
            tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_wins() {
        let source = CancelSource::new();
        assert!(!source.is_cancelled());
        assert!(source.signal().is_none());

        assert!(source.cancel(Signal::Interrupt));
        assert!(!source.cancel(Signal::Terminate));

        assert!(source.is_cancelled());
        assert_eq!(source.signal(), Some(Signal::Interrupt));
    }

    #[test]
    fn clones_share_state() {
        let source = CancelSource::new();
        let handle = source.clone();
        handle.cancel(Signal::requested("test"));
        assert_eq!(source.signal(), Some(Signal::requested("test")));
    }

    #[test]
    fn child_token_follows_source() {
        let source = CancelSource::new();
        let child = source.child_token();

        child.cancel();
        assert!(!source.is_cancelled());

        let child = source.child_token();
        source.cancel(Signal::Terminate);
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_with_signal() {
        let source = CancelSource::new();
        let waiter = {
            let source = source.clone();
            tokio::spawn(async move { source.cancelled().await })
        };
        source.cancel(Signal::Terminate);
        assert_eq!(waiter.await.unwrap(), Signal::Terminate);
    }

    #[cfg(all(unix, feature = "os-signal"))]
    #[tokio::test]
    async fn sigterm_fires_the_source() {
        let source = CancelSource::new();
        let watcher = source.watch_os_signals();

        // SAFETY: the watcher installed a SIGTERM handler before returning.
        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);

        assert_eq!(source.cancelled().await, Signal::Terminate);
        watcher.await.unwrap();
    }

    #[cfg(feature = "os-signal")]
    #[tokio::test]
    async fn watcher_stops_when_cancelled_elsewhere() {
        let source = CancelSource::new();
        let watcher = source.watch_os_signals();

        source.cancel(Signal::requested("shutdown"));

        tokio::time::timeout(std::time::Duration::from_secs(1), watcher)
            .await
            .expect("watcher exits after cancellation")
            .unwrap();
        assert!(source.is_cancelled());
    }
}
