// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `spawnkit`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spawnkit",
    version,
    about = "Run a command with project-local binaries on PATH and report how it ended.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML) with default options.
    ///
    /// If omitted, `Spawnkit.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Kill the command after this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Treat a non-zero exit as an error.
    #[arg(long)]
    pub throw_on_error: bool,

    /// Print merged stdout/stderr line by line as it arrives.
    #[arg(long)]
    pub lines: bool,

    /// Pipe the command's stdout into this second command.
    #[arg(long, value_name = "CMD")]
    pub pipe: Option<String>,

    /// Argument for the `--pipe` command (repeatable).
    #[arg(long = "pipe-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub pipe_args: Vec<String>,

    /// Print the environment the command would get, then exit.
    #[arg(long)]
    pub print_env: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPAWNKIT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run.
    #[arg(value_name = "COMMAND", required_unless_present = "print_env")]
    pub command: Option<String>,

    /// Arguments passed to the command verbatim.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
