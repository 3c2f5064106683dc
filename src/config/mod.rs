// src/config/mod.rs

//! Default execution options loaded from a TOML file.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and turn it into [`ExecOptions`](crate::exec::ExecOptions)
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ExecConfig, RawExecConfig};
pub use validate::validate_config;
