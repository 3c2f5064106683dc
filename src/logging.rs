// src/logging.rs

//! `tracing` setup for the `spawnkit` binary.
//!
//! The filter comes from the first of:
//! 1. `--log-level` (applies to the `spawnkit` target only)
//! 2. `SPAWNKIT_LOG`, in `EnvFilter` directive syntax (`debug`,
//!    `spawnkit::exec=trace,warn`, ...)
//! 3. `warn`
//!
//! Events are written to stderr; stdout belongs to the child's output.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding a filter directive.
pub const LOG_ENV_VAR: &str = "SPAWNKIT_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
}

fn build_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(format!("{DEFAULT_DIRECTIVE},spawnkit={}", directive(level)));
    }
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn cli_level_raises_the_ceiling() {
        let filter = build_filter(Some(LogLevel::Trace));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = build_filter(Some(LogLevel::Error));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
