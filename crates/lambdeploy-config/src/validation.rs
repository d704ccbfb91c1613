// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &DeployConfig) -> Result<()> {
    validate_aws_config(&config.aws)?;
    validate_package_config(&config.package)?;

    if config.identity.git_key.trim().is_empty() {
        bail!("identity.git_key must not be empty");
    }

    if config.log.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }

    Ok(())
}

fn validate_aws_config(config: &AwsConfig) -> Result<()> {
    if config.cli.trim().is_empty() {
        bail!("aws.cli must not be empty");
    }

    if let Some(region) = &config.region {
        if region.trim().is_empty() {
            bail!("aws.region must not be empty when set");
        }
    }

    Ok(())
}

fn validate_package_config(config: &PackageConfig) -> Result<()> {
    if config.zip.trim().is_empty() {
        bail!("package.zip must not be empty");
    }

    for (index, command) in config.commands.iter().enumerate() {
        match command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => bail!("package.commands[{}] must name a program", index),
        }
    }

    if config.commands.is_empty() {
        warn!("package.commands is empty; archives will be zipped without a build step");
    }

    Ok(())
}
