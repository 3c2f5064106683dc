// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ExecConfig, RawExecConfig};
use crate::errors::ConfigError;

/// Load a configuration file and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the checked [`ExecConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawExecConfig, ConfigError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawExecConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExecConfig, ConfigError> {
    let raw = load_from_path(&path)?;
    ExecConfig::try_from(raw)
}

/// `Spawnkit.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Spawnkit.toml")
}
