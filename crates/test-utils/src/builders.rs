#![allow(dead_code)]

use spawnkit::config::{ExecConfig, RawExecConfig};
use spawnkit::env::{EnvMap, EnvOverrides};

/// Builder for an ambient environment passed to `compute_env_with`.
#[derive(Default)]
pub struct AmbientEnvBuilder {
    env: EnvMap,
}

impl AmbientEnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the real process environment.
    pub fn from_process() -> Self {
        Self {
            env: spawnkit::env::ambient_env(),
        }
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Remove every casing of `PATH`.
    pub fn without_path(mut self) -> Self {
        self.env.retain(|k, _| !k.eq_ignore_ascii_case("PATH"));
        self
    }

    pub fn build(self) -> EnvMap {
        self.env
    }
}

/// Builder for caller overrides.
#[derive(Default)]
pub struct OverridesBuilder {
    env: EnvOverrides,
}

impl OverridesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), Some(value.to_string()));
        self
    }

    pub fn unset(mut self, key: &str) -> Self {
        self.env.insert(key.to_string(), None);
        self
    }

    pub fn build(self) -> EnvOverrides {
        self.env
    }
}

/// Builder for `ExecConfig` to simplify test setup.
#[derive(Default)]
pub struct ExecConfigBuilder {
    raw: RawExecConfig,
}

impl ExecConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.raw.timeout_ms = Some(ms);
        self
    }

    pub fn throw_on_error(mut self, val: bool) -> Self {
        self.raw.throw_on_error = val;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.raw.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn unset_env(mut self, key: &str) -> Self {
        self.raw.unset_env.push(key.to_string());
        self
    }

    pub fn build(self) -> ExecConfig {
        ExecConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}
