// src/abort.rs

//! External cancellation for running processes.
//!
//! An [`AbortController`] owns the right to abort; the [`AbortSignal`]s it
//! hands out are passed to [`ExecOptions::signal`](crate::exec::ExecOptions)
//! and only observe. All clones share one flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct AbortController {
    state: Arc<AbortState>,
}

/// Observer side of an [`AbortController`].
#[derive(Debug, Clone)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            state: Arc::clone(&self.state),
        }
    }

    /// Request an abort. Calling it again has no further effect.
    pub fn abort(&self) {
        self.state.aborted.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Resolve once the controller has aborted (immediately if it already
    /// has).
    pub async fn aborted(&self) {
        loop {
            // Register before checking the flag so an abort in between is
            // not missed.
            let notified = self.state.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn starts_not_aborted() {
        let controller = AbortController::new();
        assert!(!controller.is_aborted());
        assert!(!controller.signal().is_aborted());
    }

    #[test]
    fn abort_is_idempotent_and_shared() {
        let controller = AbortController::new();
        let signal = controller.signal();
        controller.abort();
        controller.abort();
        assert!(signal.is_aborted());
        assert!(signal.clone().is_aborted());
    }

    #[tokio::test]
    async fn aborted_resolves_when_already_aborted() {
        let controller = AbortController::new();
        controller.abort();
        tokio::time::timeout(Duration::from_secs(1), controller.signal().aborted())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn aborted_wakes_pending_waiter() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let waiter = tokio::spawn(async move { signal.aborted().await });
        tokio::task::yield_now().await;
        controller.abort();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
