//! `aws lambda` control-plane calls.

use crate::runner::{CommandRunner, Invocation, SystemRunner};
use lambdeploy_config::AwsConfig;
use lambdeploy_core::{
    AliasInfo, CodeUpdated, CreateFunction, FunctionConfig, FunctionCreated, FunctionService,
    ServiceError, ServiceResult, UpdateCode, UpdateConfiguration, VersionPage, VpcConfig,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Function service backed by the AWS CLI.
#[derive(Debug, Clone)]
pub struct AwsLambdaCli<R = SystemRunner> {
    runner: R,
    cli: String,
    profile: Option<String>,
    region: Option<String>,
}

impl AwsLambdaCli<SystemRunner> {
    pub fn from_config(config: &AwsConfig) -> Self {
        Self::with_runner(SystemRunner, config)
    }
}

impl<R: CommandRunner> AwsLambdaCli<R> {
    pub fn with_runner(runner: R, config: &AwsConfig) -> Self {
        Self {
            runner,
            cli: config.cli.clone(),
            profile: config.profile.clone(),
            region: config.region.clone(),
        }
    }

    fn command(&self, operation: &str) -> Invocation {
        Invocation::new(&self.cli)
            .args(["lambda", operation])
            .opt("--profile", self.profile.as_deref())
            .opt("--region", self.region.as_deref())
            .args(["--output", "json"])
    }

    fn call<T: DeserializeOwned>(&self, invocation: Invocation) -> ServiceResult<T> {
        let stdout = self.runner.run(&invocation)?;
        serde_json::from_str(&stdout).map_err(|e| {
            ServiceError::new(format!(
                "unexpected response from 'aws lambda {}': {}",
                invocation.args.get(1).map(String::as_str).unwrap_or_default(),
                e
            ))
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionResponse {
    #[serde(default)]
    function_arn: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    last_modified: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionsResponse {
    #[serde(default)]
    versions: Vec<VersionEntry>,
    next_marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionEntry {
    version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliasesResponse {
    #[serde(default)]
    aliases: Vec<AliasResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliasResponse {
    name: String,
    function_version: String,
}

impl From<AliasResponse> for AliasInfo {
    fn from(alias: AliasResponse) -> Self {
        AliasInfo {
            name: alias.name,
            function_version: alias.function_version,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> ServiceResult<String> {
    serde_json::to_string(value)
        .map_err(|e| ServiceError::new(format!("failed to encode request: {}", e)))
}

/// Create payload: the spec's config minus the ARN it may carry as a placeholder.
fn create_payload(config: &FunctionConfig) -> Map<String, Value> {
    config
        .as_map()
        .iter()
        .filter(|(key, _)| key.as_str() != "FunctionArn")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn with_vpc(invocation: Invocation, vpc: Option<&VpcConfig>) -> ServiceResult<Invocation> {
    Ok(match vpc {
        Some(vpc) => invocation.arg("--vpc-config").arg(to_json(vpc)?),
        None => invocation,
    })
}

impl<R: CommandRunner> FunctionService for AwsLambdaCli<R> {
    fn create_function(&self, request: &CreateFunction<'_>) -> ServiceResult<FunctionCreated> {
        let invocation = self.command("create-function").arg("--code").arg(format!(
            "S3Bucket={},S3Key={}",
            request.code.bucket, request.code.key
        ));
        let invocation = with_vpc(invocation, request.vpc)?
            .arg("--cli-input-json")
            .arg(to_json(&create_payload(request.config))?);

        let response: FunctionResponse = self.call(invocation)?;
        if response.function_arn.is_empty() {
            return Err(ServiceError::new(
                "create-function response did not include a FunctionArn",
            ));
        }
        debug!(arn = %response.function_arn, version = %response.version, "Function created");
        Ok(FunctionCreated {
            arn: response.function_arn,
            version: response.version,
            last_modified: response.last_modified,
        })
    }

    fn update_function_code(&self, request: &UpdateCode<'_>) -> ServiceResult<CodeUpdated> {
        let mut invocation = self
            .command("update-function-code")
            .args(["--function-name", request.function])
            .args(["--s3-bucket", request.code.bucket.as_str()])
            .args(["--s3-key", request.code.key.as_str()]);
        if request.publish {
            invocation = invocation.arg("--publish");
        }

        let response: FunctionResponse = self.call(invocation)?;
        Ok(CodeUpdated {
            version: response.version,
            last_modified: response.last_modified,
        })
    }

    fn update_function_configuration(
        &self,
        request: &UpdateConfiguration<'_>,
    ) -> ServiceResult<()> {
        let invocation = self
            .command("update-function-configuration")
            .args(["--function-name", request.function]);
        let invocation = with_vpc(invocation, request.vpc)?
            .arg("--cli-input-json")
            .arg(to_json(request.config)?);

        let _: Value = self.call(invocation)?;
        Ok(())
    }

    fn list_versions(&self, function: &str, marker: Option<&str>) -> ServiceResult<VersionPage> {
        let invocation = self
            .command("list-versions-by-function")
            .args(["--function-name", function, "--no-paginate"])
            .opt("--marker", marker);

        let response: VersionsResponse = self.call(invocation)?;
        Ok(VersionPage {
            versions: response.versions.into_iter().map(|v| v.version).collect(),
            next_marker: response.next_marker.filter(|m| !m.is_empty()),
        })
    }

    fn list_aliases(&self, function: &str) -> ServiceResult<Vec<AliasInfo>> {
        let invocation = self
            .command("list-aliases")
            .args(["--function-name", function]);

        let response: AliasesResponse = self.call(invocation)?;
        Ok(response.aliases.into_iter().map(AliasInfo::from).collect())
    }

    fn create_alias(&self, function: &str, name: &str, version: &str) -> ServiceResult<AliasInfo> {
        let invocation = self.command("create-alias").args([
            "--function-name",
            function,
            "--name",
            name,
            "--function-version",
            version,
        ]);
        let response: AliasResponse = self.call(invocation)?;
        Ok(response.into())
    }

    fn update_alias(&self, function: &str, name: &str, version: &str) -> ServiceResult<AliasInfo> {
        let invocation = self.command("update-alias").args([
            "--function-name",
            function,
            "--name",
            name,
            "--function-version",
            version,
        ]);
        let response: AliasResponse = self.call(invocation)?;
        Ok(response.into())
    }
}
