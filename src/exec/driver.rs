// src/exec/driver.rs

//! Spawning and supervising a single OS process.
//!
//! [`start`] spawns synchronously so the pid is known as soon as
//! `execute` returns. [`run`] then owns the `Child` in a background task:
//! it races the natural exit against the timeout, the abort signal and
//! explicit kill requests, waits for all output to be drained, and settles
//! the shared state exactly once.

use std::future::pending;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::env::{DEFAULT_LOCAL_BIN_DIR, ambient_env, compute_env_with};
use crate::errors::ExecError;
use crate::exec::kill::{error_code, signal_name, terminate};
use crate::exec::options::{ExecOptions, StdinSource};
use crate::exec::output::ProcessState;
use crate::exec::state::{STDERR, STDOUT, Shared};
use crate::stream::{BoxedSource, CombinedStream, combine_streams};

/// Where the child's stdin comes from once it is running.
enum StdinFeed {
    None,
    Bytes(Vec<u8>),
    Pipe(mpsc::UnboundedReceiver<Vec<u8>>),
}

/// Spawn `command`, returning the running child.
pub(crate) fn start(
    command: &str,
    args: &[String],
    options: &ExecOptions,
    piped_stdin: bool,
) -> Result<Child, ExecError> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().map_err(|e| ExecError::InvalidCwd {
            cwd: PathBuf::from("."),
            reason: e.to_string(),
        })?,
    };
    let local_bin_dir = options
        .local_bin_dir
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_LOCAL_BIN_DIR));
    let env = compute_env_with(ambient_env(), &cwd, &options.env, local_bin_dir)?;

    let stdin = if piped_stdin {
        Stdio::piped()
    } else {
        match options.stdin {
            StdinSource::Null => Stdio::null(),
            StdinSource::Inherit => Stdio::inherit(),
            StdinSource::Bytes(_) => Stdio::piped(),
        }
    };

    let mut cmd = Command::new(command);
    cmd.args(args)
        .env_clear()
        .envs(&env)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if options.cwd.is_some() {
        cmd.current_dir(&cwd);
    }

    match cmd.spawn() {
        Ok(child) => Ok(child),
        #[cfg(windows)]
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // `.cmd`/`.bat` shims and unknown commands go through cmd.exe,
            // which reports "not recognized" on stderr like any other output.
            debug!(cmd = %command, "direct spawn failed; retrying through cmd.exe");
            let mut shell = Command::new("cmd.exe");
            shell
                .arg("/d")
                .arg("/s")
                .arg("/c")
                .arg(command)
                .args(args)
                .env_clear()
                .envs(&env)
                .stdin(if piped_stdin || matches!(options.stdin, StdinSource::Bytes(_)) {
                    Stdio::piped()
                } else if options.stdin == StdinSource::Inherit {
                    Stdio::inherit()
                } else {
                    Stdio::null()
                })
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if options.cwd.is_some() {
                shell.current_dir(&cwd);
            }
            shell.spawn().map_err(|e| spawn_error(command, &e))
        }
        Err(e) => Err(spawn_error(command, &e)),
    }
}

fn spawn_error(command: &str, err: &io::Error) -> ExecError {
    ExecError::Spawn {
        command: command.to_string(),
        code: error_code(err),
        detail: err.to_string(),
    }
}

/// Supervise `child` until it exits, then settle `shared`.
pub(crate) async fn run(
    shared: Arc<Shared>,
    mut child: Child,
    command: String,
    options: ExecOptions,
    pipe_input: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
) {
    // Index order must match `STDOUT` / `STDERR`.
    let sources = vec![boxed(child.stdout.take()), boxed(child.stderr.take())];
    let combined = combine_streams(sources);
    let drain = tokio::spawn(drain_output(Arc::clone(&shared), combined));

    let feed = match (pipe_input, &options.stdin) {
        (Some(rx), _) => StdinFeed::Pipe(rx),
        (None, StdinSource::Bytes(bytes)) => StdinFeed::Bytes(bytes.clone()),
        (None, _) => StdinFeed::None,
    };
    if let Some(stdin) = child.stdin.take() {
        tokio::spawn(feed_stdin(command.clone(), stdin, feed));
    }

    let status = supervise(&shared, &mut child, &command, &options).await;

    if let Err(e) = drain.await {
        warn!(cmd = %command, error = %e, "output drain task failed");
    }

    settle(&shared, &command, &options, status);
}

fn boxed<R>(stream: Option<R>) -> BoxedSource
where
    R: AsyncRead + Send + Unpin + 'static,
{
    match stream {
        Some(stream) => Box::new(stream),
        None => Box::new(tokio::io::empty()),
    }
}

/// Outcome of the exit/timeout/abort/kill race.
struct Supervised {
    status: Option<ExitStatus>,
    timed_out: bool,
    aborted: bool,
}

async fn supervise(
    shared: &Shared,
    child: &mut Child,
    command: &str,
    options: &ExecOptions,
) -> Supervised {
    let timer = async {
        match options.timeout {
            Some(timeout) => sleep(timeout).await,
            None => pending::<()>().await,
        }
    };
    let abort = async {
        match &options.signal {
            Some(signal) => signal.aborted().await,
            None => pending::<()>().await,
        }
    };
    tokio::pin!(timer);
    tokio::pin!(abort);

    let mut timed_out = false;
    let mut aborted = false;
    let mut kill_sent = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => {
                let status = match status {
                    Ok(status) => Some(status),
                    Err(e) => {
                        warn!(cmd = %command, error = %e, "waiting for process failed");
                        None
                    }
                };

                // Output may still be draining (a grandchild can hold the
                // pipes); from here on `kill()` has nothing to signal.
                {
                    let mut inner = shared.lock();
                    inner.exited = true;
                    inner.exit_code = status.and_then(|s| s.code());
                    inner.signal_code = status.as_ref().and_then(signal_name);
                    inner.killed = kill_sent;
                }
                break status;
            }

            _ = &mut timer, if !timed_out && !aborted => {
                timed_out = true;
                debug!(cmd = %command, timeout = ?options.timeout, "timeout elapsed; killing process");
                shared.lock().killed = true;
                send_kill(child, command, &mut kill_sent);
            }

            _ = &mut abort, if !aborted && !timed_out => {
                aborted = true;
                debug!(cmd = %command, "abort signal received; killing process");
                {
                    let mut inner = shared.lock();
                    inner.killed = true;
                    inner.aborted = true;
                }
                send_kill(child, command, &mut kill_sent);
            }

            _ = shared.kill_requested.notified() => {
                debug!(cmd = %command, "kill requested");
                send_kill(child, command, &mut kill_sent);
            }
        }
    };

    Supervised {
        status,
        timed_out,
        aborted,
    }
}

fn send_kill(child: &mut Child, command: &str, kill_sent: &mut bool) {
    if *kill_sent {
        debug!(cmd = %command, "kill already sent; ignoring");
        return;
    }
    *kill_sent = true;
    if let Err(e) = terminate(child) {
        warn!(cmd = %command, error = %e, "failed to kill child process");
    }
}

fn settle(shared: &Shared, command: &str, options: &ExecOptions, race: Supervised) {
    let exit_code = race.status.and_then(|s| s.code());
    let signal_code = race.status.as_ref().and_then(signal_name);

    let state = if race.aborted {
        ProcessState::Aborted
    } else if race.timed_out {
        ProcessState::TimedOut
    } else if exit_code == Some(0) {
        ProcessState::Succeeded
    } else {
        ProcessState::FailedExit
    };

    info!(
        cmd = %command,
        exit_code = ?exit_code,
        signal = ?signal_code,
        state = ?state,
        "process settled"
    );

    let timeout_ms = options
        .timeout
        .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default();
    let throw_on_error = options.throw_on_error;

    shared.settle(state, |output| match state {
        ProcessState::TimedOut => Some(ExecError::Timeout {
            command: command.to_string(),
            timeout_ms,
            output: output.clone(),
        }),
        ProcessState::FailedExit if throw_on_error => Some(ExecError::NonZeroExit {
            command: command.to_string(),
            output: output.clone(),
        }),
        _ => None,
    });
}

/// Copy merged output into the shared buffers.
///
/// Finishes only when both streams have ended, which is what lets
/// settlement promise that no output is still in flight.
async fn drain_output(shared: Arc<Shared>, mut combined: CombinedStream) {
    while let Some(item) = combined.next_chunk().await {
        match item {
            Ok(chunk) => {
                let source = if chunk.source == STDOUT { STDOUT } else { STDERR };
                shared.append(source, &chunk.data);
            }
            Err(e) => {
                warn!(error = %e, "reading process output failed; discarding the rest");
                // Keep the surviving pipes flowing so the child cannot block
                // on a full pipe.
                combined.discard_remaining().await;
                break;
            }
        }
    }

    shared.close_output();
}

async fn feed_stdin(command: String, mut stdin: ChildStdin, feed: StdinFeed) {
    let result = match feed {
        StdinFeed::None => Ok(()),
        StdinFeed::Bytes(bytes) => stdin.write_all(&bytes).await,
        StdinFeed::Pipe(mut rx) => {
            let mut result = Ok(());
            while let Some(chunk) = rx.recv().await {
                if let Err(e) = stdin.write_all(&chunk).await {
                    result = Err(e);
                    break;
                }
            }
            result
        }
    };

    // A reader that exits early (e.g. `head`) closes the pipe on us.
    if let Err(e) = result {
        debug!(cmd = %command, error = %e, "writing to child stdin stopped");
    }
    // Dropping `stdin` closes it so the child sees EOF.
}
