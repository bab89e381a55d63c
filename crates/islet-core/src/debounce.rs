//! A single cancellable delayed task.
//!
//! The build scheduler coalesces change notifications by keeping at most one
//! pending task: scheduling cancels whatever was pending and starts the
//! delay over. The last scheduler wins; tasks never stack.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs at most one delayed task at a time.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debounce {
    /// Create a debouncer with the given delay window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// The configured delay window.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `work` to run after the delay, cancelling any previously
    /// scheduled work that has not started yet.
    ///
    /// The returned handle completes when the task finishes or is
    /// cancelled; it exists for tests and shutdown sequencing, and callers
    /// are free to drop it.
    pub async fn schedule<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self.pending.lock().await.replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => { return; }
                _ = tokio::time::sleep(delay) => {}
            }
            work.await;
        })
    }

    /// Cancel the pending task, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }
}
