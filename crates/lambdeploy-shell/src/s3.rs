//! Archive upload through `aws s3api put-object`.

use crate::runner::{CommandRunner, Invocation, SystemRunner};
use lambdeploy_config::AwsConfig;
use lambdeploy_core::{ObjectStore, ServiceResult, UploadRequest};
use tracing::debug;

/// Object store backed by the AWS CLI.
///
/// Profile and region come from each request so uploads follow the same
/// account as the function calls they precede.
#[derive(Debug, Clone)]
pub struct AwsS3Cli<R = SystemRunner> {
    runner: R,
    cli: String,
}

impl AwsS3Cli<SystemRunner> {
    pub fn from_config(config: &AwsConfig) -> Self {
        Self::with_runner(SystemRunner, config)
    }
}

impl<R: CommandRunner> AwsS3Cli<R> {
    pub fn with_runner(runner: R, config: &AwsConfig) -> Self {
        Self {
            runner,
            cli: config.cli.clone(),
        }
    }
}

impl<R: CommandRunner> ObjectStore for AwsS3Cli<R> {
    fn upload(&self, request: &UploadRequest<'_>) -> ServiceResult<()> {
        let invocation = Invocation::new(&self.cli)
            .args(["s3api", "put-object"])
            .opt("--profile", request.profile)
            .opt("--region", request.region)
            .args(["--output", "json"])
            .args(["--bucket", request.bucket, "--key", request.key])
            .arg("--body")
            .arg(request.body.to_string_lossy());

        debug!(bucket = request.bucket, key = request.key, "Uploading archive");
        self.runner.run(&invocation)?;
        Ok(())
    }
}
