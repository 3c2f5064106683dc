//! Shared fixtures for `spawnkit` integration tests.

pub mod builders;

use std::fs;
use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). `RUST_LOG` picks the filter; without it the
/// crate logs at `debug` and everything else at `warn`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,spawnkit=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: IntoFuture<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("step did not finish within {TEST_TIMEOUT:?}"),
    }
}

/// Write `contents` to `Spawnkit.toml` inside `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join("Spawnkit.toml");
    fs::write(&path, contents)?;
    Ok(path)
}
