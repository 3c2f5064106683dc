// src/exec/state.rs

//! State shared between a [`ProcessHandle`](super::ProcessHandle) and the
//! background tasks driving its process.
//!
//! The mutex is never held across an `.await`. Settlement sets the terminal
//! state under the lock and only then emits [`EVENT_CLOSE`]; waiters check
//! the state and subscribe under that same lock, so a wakeup cannot slip
//! between the two.
//!
//! Output is kept once, as raw bytes per stream plus the order in which
//! chunks arrived. Lines are only split out when someone asks for them,
//! replaying that order first.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, mpsc};

use crate::errors::{ExecError, Result};
use crate::exec::output::{Output, ProcessState};
use crate::stream::{EVENT_CLOSE, EventEmitter, LineSplitter, wait_for_event};

pub(crate) const STDOUT: usize = 0;
pub(crate) const STDERR: usize = 1;

#[derive(Debug)]
pub(crate) struct Shared {
    inner: Mutex<Inner>,
    events: EventEmitter,
    /// Permit left by `ProcessHandle::kill` for the driver.
    pub(crate) kill_requested: Notify,
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) state: ProcessState,
    pub(crate) pid: Option<u32>,
    pub(crate) exit_code: Option<i32>,
    pub(crate) signal_code: Option<String>,
    pub(crate) killed: bool,
    pub(crate) aborted: bool,
    /// The child has been reaped; signals can no longer reach it.
    pub(crate) exited: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    /// `(source, len)` runs in arrival order; adjacent runs from the same
    /// source are merged.
    arrivals: Vec<(usize, usize)>,
    /// Downstream stdin feeds registered through `pipe`.
    pipe_sinks: Vec<mpsc::UnboundedSender<Vec<u8>>>,
    lines: Option<LineFeed>,
    lines_taken: bool,
    output_closed: bool,
    /// Classification decided at settlement; `None` means `wait` succeeds.
    failure: Option<ExecError>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ProcessState::Running,
                pid: None,
                exit_code: None,
                signal_code: None,
                killed: false,
                aborted: false,
                exited: false,
                stdout: Vec::new(),
                stderr: Vec::new(),
                arrivals: Vec::new(),
                pipe_sinks: Vec::new(),
                lines: None,
                lines_taken: false,
                output_closed: false,
                failure: None,
            }),
            events: EventEmitter::new(),
            kill_requested: Notify::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record output from one stream, forwarding stdout to any pipes and
    /// completed lines to the line feed.
    pub(crate) fn append(&self, source: usize, data: &[u8]) {
        let mut inner = self.lock();
        if source == STDOUT {
            inner.stdout.extend_from_slice(data);
            inner.pipe_sinks.retain(|tx| tx.send(data.to_vec()).is_ok());
        } else {
            inner.stderr.extend_from_slice(data);
        }

        match inner.arrivals.last_mut() {
            Some((last, len)) if *last == source => *len += data.len(),
            _ => inner.arrivals.push((source, data.len())),
        }

        if let Some(feed) = inner.lines.as_mut() {
            feed.push(source, data);
        }
    }

    /// Register a pipe sink. Stdout seen so far is replayed first; if stdout
    /// has already ended the sink is closed straight away.
    pub(crate) fn attach_pipe(&self, tx: mpsc::UnboundedSender<Vec<u8>>) {
        let mut inner = self.lock();
        if !inner.stdout.is_empty() && tx.send(inner.stdout.clone()).is_err() {
            return;
        }
        if !inner.output_closed {
            inner.pipe_sinks.push(tx);
        }
    }

    /// Open the merged line feed, replaying every line completed so far.
    ///
    /// Only the first call gets a receiver.
    pub(crate) fn attach_lines(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        let mut inner = self.lock();
        if inner.lines_taken {
            return None;
        }
        inner.lines_taken = true;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut feed = LineFeed::new(tx);
        let mut offsets = [0usize; 2];
        for &(source, len) in &inner.arrivals {
            let buf = if source == STDOUT { &inner.stdout } else { &inner.stderr };
            let start = offsets[source];
            feed.push(source, &buf[start..start + len]);
            offsets[source] += len;
        }

        if inner.output_closed {
            feed.finish();
        } else {
            inner.lines = Some(feed);
        }
        Some(rx)
    }

    /// Both streams have ended: closes every pipe sink and the line feed.
    pub(crate) fn close_output(&self) {
        self.lock().close_output();
    }

    /// Move to a terminal state and wake every waiter.
    ///
    /// `classify` sees the final output and decides whether waiting fails.
    /// A handle that has already settled is left untouched.
    pub(crate) fn settle<F>(&self, state: ProcessState, classify: F)
    where
        F: FnOnce(&Output) -> Option<ExecError>,
    {
        {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return;
            }
            let output = inner.output();
            inner.failure = classify(&output);
            inner.state = state;
            inner.close_output();
        }
        self.events.emit(EVENT_CLOSE);
    }

    /// Wait for settlement and hand back the outcome.
    pub(crate) async fn settled(&self) -> Result<Output> {
        let waiter = {
            let inner = self.lock();
            if inner.state.is_terminal() {
                return inner.outcome();
            }
            wait_for_event(&self.events, EVENT_CLOSE)
        };

        // `self` keeps the emitter alive, so the only way out is the event.
        let _ = waiter.await;
        self.lock().outcome()
    }
}

impl Inner {
    fn close_output(&mut self) {
        self.output_closed = true;
        self.pipe_sinks.clear();
        if let Some(feed) = self.lines.take() {
            feed.finish();
        }
    }

    pub(crate) fn output(&self) -> Output {
        Output {
            pid: self.pid,
            exit_code: self.exit_code,
            signal_code: self.signal_code.clone(),
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
        }
    }

    fn outcome(&self) -> Result<Output> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.output()),
        }
    }
}

/// Per-source line splitting feeding one receiver.
#[derive(Debug)]
struct LineFeed {
    tx: mpsc::UnboundedSender<String>,
    splitters: [LineSplitter; 2],
}

impl LineFeed {
    fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            tx,
            splitters: [LineSplitter::new(), LineSplitter::new()],
        }
    }

    fn push(&mut self, source: usize, data: &[u8]) {
        for line in self.splitters[source].push(data) {
            // A dropped receiver only means nobody is iterating any more.
            let _ = self.tx.send(line);
        }
    }

    /// Flush trailing fragments; dropping `self` ends the sequence.
    fn finish(mut self) {
        for splitter in self.splitters.iter_mut() {
            if let Some(line) = splitter.finish() {
                let _ = self.tx.send(line);
            }
        }
    }
}
