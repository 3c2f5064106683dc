// src/env.rs

//! Child process environment construction.
//!
//! The environment handed to a spawned command is the ambient environment
//! with the caller's overrides applied on top, plus a `PATH` that lists the
//! project-local binary folder of every directory from the working directory
//! up to the filesystem root (nearest first), ahead of whatever `PATH` was
//! already in effect.
//!
//! The path variable is looked up case-insensitively (Windows commonly uses
//! `Path`), and the casing already in use is kept. Only when no path
//! variable exists at all is the canonical `PATH` key created.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::errors::{ExecError, Result};

/// Canonical name of the path-search variable.
pub const PATH_KEY: &str = "PATH";

/// Project-local binary folder prepended for every ancestor directory.
pub const DEFAULT_LOCAL_BIN_DIR: &str = "node_modules/.bin";

#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// A fully computed environment snapshot.
pub type EnvMap = BTreeMap<String, String>;

/// Caller-supplied overrides. `None` removes the variable.
pub type EnvOverrides = BTreeMap<String, Option<String>>;

/// Snapshot of the current process environment.
///
/// Variables whose name or value is not valid Unicode are skipped.
pub fn ambient_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Compute the child environment for `cwd` from the current process
/// environment, using the default local binary folder.
pub fn compute_env(cwd: &Path, extra: &EnvOverrides) -> Result<EnvMap> {
    compute_env_with(ambient_env(), cwd, extra, Path::new(DEFAULT_LOCAL_BIN_DIR))
}

/// Compute the child environment from an explicit ambient environment.
///
/// - `extra` is applied on top of `ambient` (`Some` sets, `None` removes).
/// - An explicit path value in `extra` (any casing) is kept as the prior
///   value and its key casing wins.
/// - Removing the path variable through `extra` leaves only the local binary
///   folders, under the canonical `PATH` key.
/// - The result holds exactly one path variable.
pub fn compute_env_with(
    ambient: EnvMap,
    cwd: &Path,
    extra: &EnvOverrides,
    local_bin_dir: &Path,
) -> Result<EnvMap> {
    let mut env = ambient;
    for (key, value) in extra {
        match value {
            Some(value) => {
                env.insert(key.clone(), value.clone());
            }
            None => {
                env.remove(key);
            }
        }
    }

    let explicit = extra
        .iter()
        .find_map(|(key, value)| match value {
            Some(value) if is_path_key(key) => Some((key.clone(), Some(value.clone()))),
            _ => None,
        });
    let removed = extra
        .iter()
        .any(|(key, value)| value.is_none() && is_path_key(key));

    let (key, prior) = match explicit {
        Some(found) => found,
        None if removed => (PATH_KEY.to_string(), None),
        None => match find_path_key(&env) {
            Some(key) => (key.to_string(), env.get(key).cloned()),
            None => (PATH_KEY.to_string(), None),
        },
    };

    let mut parts: Vec<String> = local_bin_dirs(cwd, local_bin_dir)?
        .iter()
        .map(|dir| dir.to_string_lossy().into_owned())
        .collect();
    if let Some(prior) = prior.filter(|p| !p.is_empty()) {
        parts.push(prior);
    }
    let value = parts.join(&PATH_LIST_SEPARATOR.to_string());

    env.retain(|k, _| !is_path_key(k));
    trace!(key = %key, path = %value, "computed child PATH");
    env.insert(key, value);

    Ok(env)
}

/// Find the key holding the path variable, whatever its casing.
///
/// Keys are visited in map order, so when several casings are present the
/// result is still deterministic.
pub fn find_path_key(env: &EnvMap) -> Option<&str> {
    env.keys().map(String::as_str).find(|k| is_path_key(k))
}

fn is_path_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(PATH_KEY)
}

/// `<dir>/<local_bin_dir>` for `cwd` and each of its ancestors, nearest
/// first, ending with the filesystem root.
///
/// `cwd` is made absolute lexically; it does not need to exist.
pub fn local_bin_dirs(cwd: &Path, local_bin_dir: &Path) -> Result<Vec<PathBuf>> {
    if cwd.as_os_str().is_empty() {
        return Err(ExecError::InvalidCwd {
            cwd: cwd.to_path_buf(),
            reason: "path is empty".to_string(),
        });
    }

    let cwd = std::path::absolute(cwd).map_err(|e| ExecError::InvalidCwd {
        cwd: cwd.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(cwd.ancestors().map(|dir| dir.join(local_bin_dir)).collect())
}
