//! Broadcast cancellation for watchers.

use std::sync::Arc;

use tokio::sync::watch;

/// One-shot stop request shared by every watcher of a race.
///
/// Cancelling is idempotent and cancelling a finished watcher is a no-op.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal every holder to stop.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its [`CancelSignal`] when dropped.
///
/// Ties watcher lifetime to the future that spawned them: dropping a race
/// midway stops its watchers as well.
#[derive(Debug)]
#[must_use = "the signal is cancelled as soon as the guard is dropped"]
pub struct CancelOnDrop {
    signal: CancelSignal,
}

impl CancelSignal {
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            signal: self.clone(),
        }
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.signal.cancel();
    }
}
