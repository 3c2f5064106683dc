// src/exec/options.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::abort::AbortSignal;
use crate::env::EnvOverrides;

/// What the child reads on stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StdinSource {
    /// Nothing; stdin is at EOF immediately.
    #[default]
    Null,
    /// Share the parent's stdin.
    Inherit,
    /// Write these bytes, then close stdin.
    Bytes(Vec<u8>),
}

/// Per-invocation settings for [`execute`](crate::exec::execute).
///
/// Every field is optional; `ExecOptions::default()` runs the command in
/// the current directory with the inherited environment, no timeout, and
/// non-zero exits reported as ordinary results.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory; also the starting point of the local binary walk.
    pub cwd: Option<PathBuf>,
    /// Variables layered over the inherited environment (`None` removes).
    pub env: EnvOverrides,
    pub timeout: Option<Duration>,
    pub signal: Option<AbortSignal>,
    /// Turn a non-zero exit into [`ExecError::NonZeroExit`](crate::errors::ExecError).
    pub throw_on_error: bool,
    /// Overrides [`DEFAULT_LOCAL_BIN_DIR`](crate::env::DEFAULT_LOCAL_BIN_DIR).
    pub local_bin_dir: Option<PathBuf>,
    pub stdin: StdinSource,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), Some(value.into()));
        self
    }

    pub fn unset_env(mut self, key: impl Into<String>) -> Self {
        self.env.insert(key.into(), None);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn throw_on_error(mut self, throw: bool) -> Self {
        self.throw_on_error = throw;
        self
    }

    pub fn local_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_bin_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, stdin: StdinSource) -> Self {
        self.stdin = stdin;
        self
    }
}
