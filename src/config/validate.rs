// src/config/validate.rs

use crate::config::model::{ExecConfig, RawExecConfig};
use crate::errors::ConfigError;

impl TryFrom<RawExecConfig> for ExecConfig {
    type Error = ConfigError;

    fn try_from(raw: RawExecConfig) -> Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ExecConfig::new_unchecked(raw))
    }
}

/// Check the semantic rules TOML deserialization cannot express.
pub fn validate_config(cfg: &RawExecConfig) -> Result<(), ConfigError> {
    validate_timeout(cfg)?;
    validate_local_bin_dir(cfg)?;
    validate_env(cfg)?;
    Ok(())
}

fn validate_timeout(cfg: &RawExecConfig) -> Result<(), ConfigError> {
    if cfg.timeout_ms == Some(0) {
        return Err(ConfigError::Invalid(
            "timeout_ms must be >= 1 (got 0); omit it to disable the timeout".to_string(),
        ));
    }
    Ok(())
}

fn validate_local_bin_dir(cfg: &RawExecConfig) -> Result<(), ConfigError> {
    if let Some(dir) = &cfg.local_bin_dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "local_bin_dir must not be empty".to_string(),
            ));
        }
        if dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "local_bin_dir must be relative to each directory (got {:?})",
                dir
            )));
        }
    }
    Ok(())
}

fn validate_env(cfg: &RawExecConfig) -> Result<(), ConfigError> {
    for key in cfg.env.keys().chain(cfg.unset_env.iter()) {
        validate_env_key(key)?;
    }

    for (key, value) in cfg.env.iter() {
        if value.contains('\0') {
            return Err(ConfigError::Invalid(format!(
                "env value for '{}' contains a NUL byte",
                key
            )));
        }
    }

    if let Some(key) = cfg.unset_env.iter().find(|k| cfg.env.contains_key(*k)) {
        return Err(ConfigError::Invalid(format!(
            "'{}' is both set in [env] and listed in unset_env",
            key
        )));
    }

    Ok(())
}

fn validate_env_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::Invalid(
            "environment variable names must not be empty".to_string(),
        ));
    }
    if key.contains('=') || key.contains('\0') {
        return Err(ConfigError::Invalid(format!(
            "invalid environment variable name '{}'",
            key.escape_debug()
        )));
    }
    Ok(())
}
