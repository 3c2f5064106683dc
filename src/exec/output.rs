// src/exec/output.rs

/// Lifecycle of a process handle.
///
/// A handle starts `Running` and moves to exactly one of the other states,
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    /// Exited with code 0.
    Succeeded,
    /// Exited with a non-zero code, or was ended by a signal.
    FailedExit,
    /// The OS never created the process.
    FailedSpawn,
    /// Killed because the timeout elapsed first.
    TimedOut,
    /// Killed because the abort signal fired first.
    Aborted,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

/// Everything a settled process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    /// Name of the terminating signal (`"SIGTERM"`), when there was one.
    pub signal_code: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
