mod common;
use crate::common::{TestResult, init_tracing};

use std::path::{Path, PathBuf};

use tempfile::tempdir;

use spawnkit::env::{
    DEFAULT_LOCAL_BIN_DIR, EnvMap, PATH_KEY, PATH_LIST_SEPARATOR, ambient_env, find_path_key,
};
use spawnkit::errors::ExecError;
use spawnkit::{compute_env, compute_env_with};
use spawnkit_test_utils::builders::{AmbientEnvBuilder, OverridesBuilder};

fn path_entries(env: &EnvMap) -> Vec<String> {
    let key = find_path_key(env).expect("a path variable");
    env[key]
        .split(PATH_LIST_SEPARATOR)
        .map(str::to_string)
        .collect()
}

fn bin_dir(dir: &Path) -> String {
    dir.join(DEFAULT_LOCAL_BIN_DIR).to_string_lossy().into_owned()
}

#[test]
fn adds_node_modules_bin_to_path() -> TestResult {
    init_tracing();

    let cwd = std::env::current_dir()?;
    let env = compute_env(&cwd, &OverridesBuilder::new().build())?;

    assert!(path_entries(&env).contains(&bin_dir(&cwd)));
    Ok(())
}

#[test]
fn extends_process_env() -> TestResult {
    init_tracing();

    let cwd = std::env::current_dir()?;
    let ambient = ambient_env();
    let env = compute_env(&cwd, &OverridesBuilder::new().build())?;

    for (key, value) in ambient.iter().filter(|(k, _)| !k.eq_ignore_ascii_case(PATH_KEY)) {
        assert_eq!(env.get(key), Some(value), "variable {key} changed");
    }
    Ok(())
}

#[test]
fn supports_case_insensitive_path_keys() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let ambient = AmbientEnvBuilder::new().var("HOME", "/home/me").build();
    let extra = OverridesBuilder::new().set("PatH", "/foo").build();

    let env = compute_env_with(ambient, dir.path(), &extra, Path::new(DEFAULT_LOCAL_BIN_DIR))?;

    let keys: Vec<&String> = env.keys().collect();
    assert_eq!(keys, vec!["HOME", "PatH"]);
    let entries = path_entries(&env);
    assert_eq!(entries.first(), Some(&bin_dir(dir.path())));
    assert_eq!(entries.last().map(String::as_str), Some("/foo"));
    Ok(())
}

#[test]
fn uses_default_key_when_path_is_unset() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let ambient = AmbientEnvBuilder::new().var("Path", "/usr/bin").build();
    let extra = OverridesBuilder::new().unset("PatH").build();

    let env = compute_env_with(ambient, dir.path(), &extra, Path::new(DEFAULT_LOCAL_BIN_DIR))?;

    assert_eq!(find_path_key(&env), Some(PATH_KEY));
    let entries = path_entries(&env);
    assert!(entries.contains(&bin_dir(dir.path())));
    assert!(!entries.iter().any(|e| e == "/usr/bin"));
    Ok(())
}

#[test]
fn uses_default_key_when_no_path_exists() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let ambient = AmbientEnvBuilder::from_process().without_path().build();

    let env = compute_env_with(
        ambient,
        dir.path(),
        &OverridesBuilder::new().build(),
        Path::new(DEFAULT_LOCAL_BIN_DIR),
    )?;

    assert_eq!(find_path_key(&env), Some(PATH_KEY));
    assert!(path_entries(&env).contains(&bin_dir(dir.path())));
    Ok(())
}

#[test]
fn prefix_runs_from_cwd_to_root_before_prior_path() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let nested = dir.path().join("a").join("b");
    let ambient = AmbientEnvBuilder::new().var(PATH_KEY, "/usr/bin").build();

    let env = compute_env_with(
        ambient,
        &nested,
        &OverridesBuilder::new().build(),
        Path::new(DEFAULT_LOCAL_BIN_DIR),
    )?;

    let entries = path_entries(&env);
    let expected: Vec<String> = nested.ancestors().map(bin_dir).collect();
    assert_eq!(entries[..expected.len()], expected[..]);
    assert_eq!(entries.last().map(String::as_str), Some("/usr/bin"));
    assert_eq!(entries.len(), expected.len() + 1);
    Ok(())
}

#[test]
fn custom_local_bin_dir_is_used() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let env = compute_env_with(
        EnvMap::new(),
        dir.path(),
        &OverridesBuilder::new().build(),
        Path::new("tools/bin"),
    )?;

    let first: PathBuf = path_entries(&env)[0].clone().into();
    assert_eq!(first, dir.path().join("tools/bin"));
    Ok(())
}

#[test]
fn duplicate_path_casings_collapse_to_one() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let ambient = AmbientEnvBuilder::new()
        .var("PATH", "/one")
        .var("Path", "/two")
        .build();

    let env = compute_env_with(
        ambient,
        dir.path(),
        &OverridesBuilder::new().build(),
        Path::new(DEFAULT_LOCAL_BIN_DIR),
    )?;

    let path_keys: Vec<&String> = env.keys().filter(|k| k.eq_ignore_ascii_case("path")).collect();
    assert_eq!(path_keys.len(), 1);
    Ok(())
}

#[test]
fn empty_cwd_is_rejected() {
    init_tracing();

    let result = compute_env_with(
        EnvMap::new(),
        Path::new(""),
        &OverridesBuilder::new().build(),
        Path::new(DEFAULT_LOCAL_BIN_DIR),
    );
    assert!(matches!(result, Err(ExecError::InvalidCwd { .. })));
}
