// src/stream/event.rs

//! Single-shot named events.
//!
//! [`wait_for_event`] registers interest *synchronously* and hands back a
//! future, so an [`EventEmitter::emit`] issued right after the call is never
//! lost. Each subscription fires at most once and is removed when it fires.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    #[error("event emitter dropped before the event fired")]
    EmitterDropped,
}

/// Emitted by a process handle once it has settled.
pub const EVENT_CLOSE: &str = "close";

#[derive(Debug, Default)]
pub struct EventEmitter {
    waiters: Mutex<HashMap<String, Vec<oneshot::Sender<()>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event`, waking (and dropping) every current subscription.
    ///
    /// Returns how many subscribers were woken.
    pub fn emit(&self, event: &str) -> usize {
        let waiters = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event)
            .unwrap_or_default();

        waiters
            .into_iter()
            .filter(|tx| !tx.is_closed())
            .map(|tx| tx.send(()))
            .filter(Result::is_ok)
            .count()
    }

    /// Number of live subscriptions for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map(|v| v.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn subscribe(&self, event: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = waiters.entry(event.to_string()).or_default();
        // Drop subscriptions whose futures were abandoned.
        slot.retain(|tx| !tx.is_closed());
        slot.push(tx);
        rx
    }
}

/// Wait for the next `event` emitted by `emitter`.
///
/// The subscription is taken when this function is called, not when the
/// returned future is first polled.
pub fn wait_for_event(
    emitter: &EventEmitter,
    event: &str,
) -> impl Future<Output = Result<(), EventError>> + Send + 'static {
    let rx = emitter.subscribe(event);
    async move { rx.await.map_err(|_| EventError::EmitterDropped) }
}
