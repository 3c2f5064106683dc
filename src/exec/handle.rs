// src/exec/handle.rs

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;
use crate::exec::driver;
use crate::exec::options::ExecOptions;
use crate::exec::output::{Output, ProcessState};
use crate::exec::state::Shared;

/// One spawned OS process and its eventual outcome.
///
/// The live fields (`pid`, `exit_code`, `killed`, ...) can be read at any
/// time. Completion is observed either in bulk with [`wait`](Self::wait)
/// (or by awaiting the handle), or line by line with
/// [`lines`](Self::lines).
///
/// Dropping the handle does not stop the process; the background driver
/// keeps it until it exits.
#[derive(Debug)]
pub struct ProcessHandle {
    shared: Arc<Shared>,
    command: String,
}

impl ProcessHandle {
    /// Spawn `command` and start supervising it.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(
        command: &str,
        args: Vec<String>,
        options: ExecOptions,
        pipe_input: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    ) -> Self {
        let shared = Arc::new(Shared::new());

        debug!(cmd = %command, args = ?args, cwd = ?options.cwd, "spawning process");

        match driver::start(command, &args, &options, pipe_input.is_some()) {
            Ok(child) => {
                shared.lock().pid = child.id();
                tokio::spawn(driver::run(
                    Arc::clone(&shared),
                    child,
                    command.to_string(),
                    options,
                    pipe_input,
                ));
            }
            Err(err) => {
                debug!(cmd = %command, error = %err, "spawn failed");
                shared.settle(ProcessState::FailedSpawn, |_| Some(err));
            }
        }

        Self {
            shared,
            command: command.to_string(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// OS process id; `None` if the process could not be spawned.
    pub fn pid(&self) -> Option<u32> {
        self.shared.lock().pid
    }

    /// `None` while running, and after a signal-induced exit.
    pub fn exit_code(&self) -> Option<i32> {
        self.shared.lock().exit_code
    }

    pub fn signal_code(&self) -> Option<String> {
        self.shared.lock().signal_code.clone()
    }

    pub fn killed(&self) -> bool {
        self.shared.lock().killed
    }

    pub fn aborted(&self) -> bool {
        self.shared.lock().aborted
    }

    pub fn state(&self) -> ProcessState {
        self.shared.lock().state
    }

    /// Output captured so far.
    pub fn output(&self) -> Output {
        self.shared.lock().output()
    }

    /// Ask the process to terminate.
    ///
    /// Returns `true` if a termination request was issued, `false` if the
    /// process has already exited (even while its output is still being
    /// drained) or was never spawned. Calling it again is harmless. The handle settles through the normal exit path once the OS
    /// reports the process gone.
    pub fn kill(&self) -> bool {
        {
            let mut inner = self.shared.lock();
            if inner.exited || inner.state.is_terminal() || inner.pid.is_none() {
                return false;
            }
            inner.killed = true;
        }
        self.shared.kill_requested.notify_one();
        true
    }

    /// Wait for the process to settle.
    ///
    /// Fails with [`ExecError::Spawn`](crate::errors::ExecError::Spawn) when
    /// the process never started, [`ExecError::Timeout`](crate::errors::ExecError::Timeout)
    /// when the timeout killed it, and
    /// [`ExecError::NonZeroExit`](crate::errors::ExecError::NonZeroExit) for a
    /// failed exit when `throw_on_error` is set. An aborted process resolves
    /// normally with whatever output it produced.
    pub async fn wait(&self) -> Result<Output> {
        self.shared.settled().await
    }

    /// Merged stdout/stderr lines in arrival order.
    ///
    /// Lines produced before the call are replayed first, so calling it
    /// late (even after [`wait`](Self::wait)) loses nothing. The sequence
    /// can only be consumed once: a second call returns an iterator that
    /// yields no lines and only reports the final outcome.
    pub fn lines(&self) -> ProcessLines {
        ProcessLines {
            shared: Arc::clone(&self.shared),
            rx: self.shared.attach_lines(),
            done: false,
        }
    }

    /// Start `command` with this process's stdout as its stdin.
    ///
    /// Stdout already produced is replayed, so calling `pipe` after the
    /// source has written something loses nothing. The new handle settles on
    /// its own; await both handles to observe both exit codes.
    pub fn pipe<S: AsRef<str>>(&self, command: &str, args: &[S], options: ExecOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.attach_pipe(tx);
        let args = args.iter().map(|a| a.as_ref().to_string()).collect();
        Self::spawn(command, args, options, Some(rx))
    }
}

impl IntoFuture for ProcessHandle {
    type Output = Result<Output>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

impl<'a> IntoFuture for &'a ProcessHandle {
    type Output = Result<Output>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// Single-pass line sequence returned by [`ProcessHandle::lines`].
#[derive(Debug)]
pub struct ProcessLines {
    shared: Arc<Shared>,
    rx: Option<mpsc::UnboundedReceiver<String>>,
    done: bool,
}

impl ProcessLines {
    /// Next line, `Ok(None)` at the end.
    ///
    /// When the settled process would make [`ProcessHandle::wait`] fail, the
    /// end of the sequence is reported as that error instead.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }

        if let Some(rx) = self.rx.as_mut() {
            if let Some(line) = rx.recv().await {
                return Ok(Some(line));
            }
        }

        self.done = true;
        self.rx = None;
        self.shared.settled().await.map(|_| None)
    }

    /// Drain the remaining lines.
    pub async fn collect(mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }
}
