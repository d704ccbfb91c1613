// Configuration source loading.
//
// Priority order:
// 1. Environment variables (LAMBDEPLOY_* prefix)
// 2. Explicit config file (--config flag)
// 3. Config file path from LAMBDEPLOY_CONFIG
// 4. Default config files (./lambdeploy.toml, ./.lambdeploy.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::DeployConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_FILES: &[&str] = &["./lambdeploy.toml", "./.lambdeploy.toml"];

pub(crate) fn load_config<E: EnvSource>(explicit: Option<&Path>, env: &E) -> Result<DeployConfig> {
    let mut config = match config_file(explicit, env) {
        Some(path) => read_file(&path)?,
        None => DeployConfig::default(),
    };

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Pick the config file to read, if any. An explicit path is returned even
/// when it does not exist so the read reports it.
fn config_file<E: EnvSource>(explicit: Option<&Path>, env: &E) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env.get("CONFIG").filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    DEFAULT_FILES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn read_file(path: &Path) -> Result<DeployConfig> {
    debug!("Loading config file: {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    DeployConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub(crate) struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
