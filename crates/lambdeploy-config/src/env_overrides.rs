use super::{DeployConfig, LogFormat};
use anyhow::{Context, Result};

pub const ENV_PREFIX: &str = "LAMBDEPLOY_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the LAMBDEPLOY_ prefix
    /// Used for AWS standard variables (AWS_PROFILE, AWS_REGION)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the tool config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut DeployConfig, env: &E) -> Result<()> {
    // AWS CLI
    if let Some(cli) = get_env_string(env, "AWS_CLI") {
        config.aws.cli = cli;
    }
    if let Some(profile) = get_env_string(env, "PROFILE") {
        config.aws.profile = Some(profile);
    } else if config.aws.profile.is_none() {
        config.aws.profile = get_raw_env_string(env, "AWS_PROFILE");
    }
    if let Some(region) = get_env_string(env, "REGION") {
        config.aws.region = Some(region);
    } else if config.aws.region.is_none() {
        config.aws.region = get_raw_env_string(env, "AWS_REGION");
    }

    // Packaging
    if let Some(zip) = get_env_string(env, "ZIP") {
        config.package.zip = zip;
    }

    // Identity
    if let Some(key) = get_env_string(env, "GIT_KEY") {
        config.identity.git_key = key;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid LAMBDEPLOY_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.trim().is_empty())
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key).filter(|v| !v.trim().is_empty())
}
