// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::env::EnvOverrides;
use crate::exec::ExecOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// cwd = "packages/app"
/// timeout_ms = 5000
/// throw_on_error = true
/// local_bin_dir = "node_modules/.bin"
/// unset_env = ["NO_COLOR"]
///
/// [env]
/// FORCE_COLOR = "1"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExecConfig {
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Kill the process after this many milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub throw_on_error: bool,

    /// Folder appended to every ancestor directory when building `PATH`.
    #[serde(default)]
    pub local_bin_dir: Option<PathBuf>,

    /// Variables to set in the child environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Variables to remove from the child environment.
    #[serde(default)]
    pub unset_env: Vec<String>,
}

/// Validated configuration. Build it with `ExecConfig::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub throw_on_error: bool,
    pub local_bin_dir: Option<PathBuf>,
    pub env: EnvOverrides,
}

impl ExecConfig {
    /// Construct without validation; only `TryFrom<RawExecConfig>` calls this.
    pub(crate) fn new_unchecked(raw: RawExecConfig) -> Self {
        let mut env: EnvOverrides = raw
            .env
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        for key in raw.unset_env {
            env.insert(key, None);
        }

        Self {
            cwd: raw.cwd,
            timeout: raw.timeout_ms.map(Duration::from_millis),
            throw_on_error: raw.throw_on_error,
            local_bin_dir: raw.local_bin_dir,
            env,
        }
    }

    /// Execution options seeded from this config.
    pub fn to_options(&self) -> ExecOptions {
        ExecOptions {
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            timeout: self.timeout,
            throw_on_error: self.throw_on_error,
            local_bin_dir: self.local_bin_dir.clone(),
            ..ExecOptions::default()
        }
    }
}
