//! Deploying-user lookup from git configuration.

use crate::runner::{CommandRunner, Invocation, SystemRunner};
use lambdeploy_config::IdentityConfig;
use lambdeploy_core::{DeployerIdentity, ServiceError, ServiceResult};

/// Reads the user name from `git config <key>`.
#[derive(Debug, Clone)]
pub struct GitIdentity<R = SystemRunner> {
    runner: R,
    key: String,
}

impl GitIdentity<SystemRunner> {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::with_runner(SystemRunner, config)
    }
}

impl<R: CommandRunner> GitIdentity<R> {
    pub fn with_runner(runner: R, config: &IdentityConfig) -> Self {
        Self {
            runner,
            key: config.git_key.clone(),
        }
    }
}

impl<R: CommandRunner> DeployerIdentity for GitIdentity<R> {
    fn current_user(&self) -> ServiceResult<String> {
        let invocation = Invocation::new("git").args(["config", self.key.as_str()]);
        let user = self
            .runner
            .run(&invocation)
            .map_err(|e| ServiceError::new(format!("git config {} is not set: {}", self.key, e)))?;

        let user = user.trim();
        if user.is_empty() {
            return Err(ServiceError::new(format!(
                "git config {} is empty",
                self.key
            )));
        }
        Ok(user.to_string())
    }
}
