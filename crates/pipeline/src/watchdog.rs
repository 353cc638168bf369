//! One-shot cancellable poll timer.
//!
//! A [`WatchdogHandle`] owns a spawned task that sleeps for the grace
//! period and then runs its action once. Cancelling it before the delay
//! elapses drops the action unrun. Cancelling after the action started is
//! a no-op; a running action is never aborted.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a scheduled watchdog.
#[derive(Debug)]
pub struct WatchdogHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchdogHandle {
    /// Schedule `action` to run once after `delay`.
    pub fn spawn<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => action().await,
            }
        });

        Self { cancel, task }
    }

    /// Stop the timer if it has not fired yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the timer task has exited (fired and completed, or cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
