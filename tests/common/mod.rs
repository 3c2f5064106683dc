#![allow(dead_code)]

pub use spawnkit_test_utils::{init_tracing, with_timeout};

use spawnkit::{ExecOptions, ProcessHandle, execute};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Run `script` through `sh -c`.
pub fn sh(script: &str, options: ExecOptions) -> ProcessHandle {
    execute("sh", &["-c", script], options)
}
