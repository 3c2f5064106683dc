// src/lib.rs

//! Launch external commands and observe them through a single handle.
//!
//! ```no_run
//! # async fn demo() -> Result<(), spawnkit::errors::ExecError> {
//! use spawnkit::{ExecOptions, x};
//!
//! let output = x("echo", &["foo"], ExecOptions::default()).await?;
//! assert_eq!(output.stdout, "foo\n");
//!
//! let proc = x("ls", &["-1"], ExecOptions::default());
//! let mut lines = proc.lines();
//! while let Some(line) = lines.next_line().await? {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod abort;
pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod stream;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

pub use crate::abort::{AbortController, AbortSignal};
pub use crate::env::{compute_env, compute_env_with};
pub use crate::errors::ExecError;
pub use crate::exec::{
    ExecOptions, NO_ARGS, Output, ProcessHandle, ProcessLines, ProcessState, StdinSource,
    execute, x,
};
pub use crate::stream::{combine_streams, wait_for_event};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate};
use crate::env::{DEFAULT_LOCAL_BIN_DIR, ambient_env};

/// Exit status used when the command never started.
const EXIT_SPAWN_FAILED: i32 = 127;
/// Exit status used when `--timeout` killed the command.
const EXIT_TIMED_OUT: i32 = 124;
/// Exit status used when Ctrl-C aborted the command.
const EXIT_ABORTED: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - spawning (and optionally piping) the command
/// - Ctrl-C handling through an [`AbortController`]
///
/// Returns the exit status the binary should end with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut options = load_options(&args)?;

    if args.print_env {
        print_env(&options)?;
        return Ok(0);
    }

    let command = args
        .command
        .clone()
        .ok_or_else(|| anyhow!("no command given"))?;

    // Ctrl-C → abort the running process(es).
    let controller = AbortController::new();
    options.signal = Some(controller.signal());
    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; aborting");
            controller.abort();
        });
    }

    let source = execute(&command, &args.args, options.clone());
    let (handle, upstream) = match &args.pipe {
        Some(pipe_cmd) => {
            let piped = source.pipe(pipe_cmd, &args.pipe_args, options);
            (piped, Some(source))
        }
        None => (source, None),
    };

    let mut code = if args.lines {
        let mut lines = handle.lines();
        let result = loop {
            match lines.next_line().await {
                Ok(Some(line)) => println!("{line}"),
                Ok(None) => break handle.wait().await,
                Err(e) => break Err(e),
            }
        };
        exit_status(&handle, result, false)
    } else {
        let result = handle.wait().await;
        exit_status(&handle, result, true)
    };

    if let Some(upstream) = upstream {
        let result = upstream.wait().await;
        let never_finished = upstream.aborted()
            || matches!(
                result,
                Err(ExecError::Spawn { .. } | ExecError::InvalidCwd { .. } | ExecError::Timeout { .. })
            );

        if never_finished {
            let upstream_code = exit_status(&upstream, result, false);
            if code == 0 {
                code = upstream_code;
            }
        } else {
            match result {
                Ok(out) => debug!(cmd = %command, exit_code = ?out.exit_code, "upstream settled"),
                Err(e) => eprintln!("spawnkit: {e}"),
            }
        }
    }

    Ok(code)
}

fn load_options(args: &CliArgs) -> Result<ExecOptions> {
    let config_path = match &args.config {
        Some(path) => Some(PathBuf::from(path)),
        None => Some(default_config_path()).filter(|p| p.is_file()),
    };

    let mut options = match config_path {
        Some(path) => {
            let cfg = load_and_validate(&path)
                .with_context(|| format!("loading config {:?}", path))?;
            debug!(?path, "loaded config");
            cfg.to_options()
        }
        None => ExecOptions::default(),
    };

    if let Some(cwd) = &args.cwd {
        options.cwd = Some(PathBuf::from(cwd));
    }
    if let Some(ms) = args.timeout {
        if ms == 0 {
            return Err(anyhow!("--timeout must be >= 1"));
        }
        options.timeout = Some(std::time::Duration::from_millis(ms));
    }
    if args.throw_on_error {
        options.throw_on_error = true;
    }

    Ok(options)
}

fn print_env(options: &ExecOptions) -> Result<()> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("reading current directory")?,
    };
    let local_bin_dir = options
        .local_bin_dir
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_LOCAL_BIN_DIR));

    let env = compute_env_with(ambient_env(), &cwd, &options.env, local_bin_dir)?;
    for (key, value) in env {
        println!("{key}={value}");
    }
    Ok(())
}

/// Map a settled handle to the binary's exit status, printing output and
/// errors on the way.
fn exit_status(
    handle: &ProcessHandle,
    result: std::result::Result<Output, ExecError>,
    print_output: bool,
) -> i32 {
    if print_output {
        let output = match &result {
            Ok(output) => Some(output),
            Err(e) => e.output(),
        };
        if let Some(output) = output {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
        }
    }

    match result {
        Ok(_) if handle.aborted() => EXIT_ABORTED,
        Ok(output) => output.exit_code.unwrap_or(1),
        Err(e) => {
            eprintln!("spawnkit: {e}");
            match e {
                ExecError::Spawn { .. } | ExecError::InvalidCwd { .. } => EXIT_SPAWN_FAILED,
                ExecError::Timeout { .. } => EXIT_TIMED_OUT,
                ExecError::NonZeroExit { output, .. } => output.exit_code.unwrap_or(1),
            }
        }
    }
}
