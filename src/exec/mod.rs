// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external commands with `tokio::process::Command` and
//! exposes each one as a [`ProcessHandle`].
//!
//! - [`handle`] owns the caller-facing handle and its line iterator.
//! - [`driver`] spawns the process and supervises it (exit, timeout, abort,
//!   kill) in a background task.
//! - [`state`] is the state shared between the two.
//! - [`options`] / [`output`] are the plain data types.
//! - [`kill`] hides the platform-specific signal handling.

mod driver;
pub mod handle;
mod kill;
pub mod options;
pub mod output;
mod state;

pub use handle::{ProcessHandle, ProcessLines};
pub use options::{ExecOptions, StdinSource};
pub use output::{Output, ProcessState};

/// Empty argument list, for commands that take none.
pub const NO_ARGS: &[&str] = &[];

/// Run `command` with `args`.
///
/// The process is spawned before this returns; spawn failures are not
/// reported here but when the handle is awaited or iterated. Must be called
/// from within a Tokio runtime.
pub fn execute<S: AsRef<str>>(command: &str, args: &[S], options: ExecOptions) -> ProcessHandle {
    let args = args.iter().map(|a| a.as_ref().to_string()).collect();
    ProcessHandle::spawn(command, args, options, None)
}

/// Short alias for [`execute`].
pub fn x<S: AsRef<str>>(command: &str, args: &[S], options: ExecOptions) -> ProcessHandle {
    execute(command, args, options)
}
