// src/errors.rs

//! Crate-wide error types.
//!
//! [`ExecError`] is what a settled [`ProcessHandle`](crate::exec::ProcessHandle)
//! hands back. It is `Clone` because a handle can be awaited (or iterated)
//! more than once and every caller gets the same classification.
//!
//! [`ConfigError`] covers loading and validating `Spawnkit.toml`.

use std::path::PathBuf;

use thiserror::Error;

use crate::exec::Output;

#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// The OS could not create the process at all.
    #[error("spawn {command} {code}")]
    Spawn {
        command: String,
        /// Symbolic OS error code, e.g. `ENOENT`.
        code: String,
        /// Full OS error text.
        detail: String,
    },

    #[error("process '{command}' exited with non-zero status ({})", describe_exit(output))]
    NonZeroExit { command: String, output: Output },

    #[error("process '{command}' timed out after {timeout_ms}ms")]
    Timeout {
        command: String,
        timeout_ms: u64,
        output: Output,
    },

    #[error("invalid working directory {cwd:?}: {reason}")]
    InvalidCwd { cwd: PathBuf, reason: String },
}

impl ExecError {
    /// Output captured before the failure, when the process got far enough
    /// to produce any.
    pub fn output(&self) -> Option<&Output> {
        match self {
            ExecError::NonZeroExit { output, .. } | ExecError::Timeout { output, .. } => {
                Some(output)
            }
            ExecError::Spawn { .. } | ExecError::InvalidCwd { .. } => None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output().and_then(|o| o.exit_code)
    }
}

fn describe_exit(output: &Output) -> String {
    match (output.exit_code, output.signal_code.as_deref()) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(signal)) => format!("signal {signal}"),
        (None, None) => "unknown status".to_string(),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ExecError>;
