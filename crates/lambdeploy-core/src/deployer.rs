//! Create, update and set-stage flows.
//!
//! Each flow loads the spec (and history), talks to the injected
//! collaborators one call at a time, and persists whatever changed. A flow
//! stops at the first failure. Once the remote function has been mutated any
//! later failure is reported as [`DeployError::PartialFailure`]; nothing is
//! rolled back.

use crate::error::{DeployError, DeployStep, FileKind, Result};
use crate::history::{DeploymentRecord, History};
use crate::service::{
    CodeLocation, CreateFunction, DeployerIdentity, FunctionService, ObjectStore,
    PackageBuilder, PackageRequest, UpdateCode, UpdateConfiguration, UploadRequest,
};
use crate::spec::FunctionSpec;
use crate::versions::{latest_version, VersionPages};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options for one invocation, as parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Deploy an archive that is already in the bucket instead of building one.
    pub skip_upload: bool,
    /// Stage alias to point at the newly created version (create only).
    pub stage: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Archive name to use instead of `<zipfile>_<unix-millis>.zip`.
    pub archive: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub function: String,
    pub arn: String,
    pub version: String,
    pub stage: Option<String>,
    pub history_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub function: String,
    pub version: String,
    pub archive: String,
    pub history_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub function: String,
    pub stage: String,
    pub version: String,
    /// `true` when the alias did not exist before.
    pub created: bool,
}

/// Steps finished so far, and whether any of them changed the remote function.
#[derive(Debug, Default)]
struct Progress {
    completed: Vec<DeployStep>,
    remote_changed: bool,
}

impl Progress {
    fn done(&mut self, step: DeployStep) {
        self.completed.push(step);
    }

    fn remote(&mut self, step: DeployStep) {
        self.remote_changed = true;
        self.done(step);
    }

    fn fail(&self, step: DeployStep, err: impl Display) -> DeployError {
        let message = err.to_string();
        if self.remote_changed {
            DeployError::PartialFailure {
                step,
                completed: self.completed.clone(),
                message,
            }
        } else {
            DeployError::ExternalCall { step, message }
        }
    }
}

/// Orchestrates deployments of a single function against injected collaborators.
pub struct Deployer<'a> {
    packager: &'a dyn PackageBuilder,
    store: &'a dyn ObjectStore,
    functions: &'a dyn FunctionService,
    identity: &'a dyn DeployerIdentity,
}

impl<'a> Deployer<'a> {
    pub fn new(
        packager: &'a dyn PackageBuilder,
        store: &'a dyn ObjectStore,
        functions: &'a dyn FunctionService,
        identity: &'a dyn DeployerIdentity,
    ) -> Self {
        Self {
            packager,
            store,
            functions,
            identity,
        }
    }

    /// Create the remote function for a spec that has never been deployed.
    pub fn create(&self, spec_path: &Path, options: &DeployOptions) -> Result<CreateOutcome> {
        let spec_path = resolve_spec_path(spec_path)?;
        let mut spec = FunctionSpec::load(&spec_path)?;
        let function = spec.function_name().to_string();

        if let Some(arn) = spec.function_arn() {
            return Err(DeployError::AlreadyExists(format!(
                "function '{}' already has FunctionArn {}; use `update` instead",
                function, arn
            )));
        }

        let history_path = History::path_for(&spec_path);
        if history_path.exists() {
            return Err(DeployError::AlreadyExists(format!(
                "deployment history {} exists but the spec has no FunctionArn; \
                 move the history aside or restore the ARN",
                history_path.display()
            )));
        }

        let stage = non_empty(options.stage.as_deref().map(str::trim), "stage")?;

        let mut progress = Progress::default();
        let user = self.resolve_user(&mut progress)?;
        let archive = archive_name(&spec, options);
        let code = self.stage_archive(&spec, &archive, options, &mut progress)?;

        info!(function = %function, key = %code.key, "Creating lambda function");
        let created = self
            .functions
            .create_function(&CreateFunction {
                code: &code,
                config: &spec.lambdaconfig,
                vpc: spec.vpcconfig.as_ref(),
            })
            .map_err(|e| progress.fail(DeployStep::CreateFunction, e))?;
        progress.remote(DeployStep::CreateFunction);
        info!(arn = %created.arn, version = %created.version, "Lambda function created");

        spec.lambdaconfig.set_function_arn(&created.arn);
        spec.save(&spec_path)
            .map_err(|e| progress.fail(DeployStep::SaveSpec, error_chain(&e)))?;
        progress.done(DeployStep::SaveSpec);

        let alias = match stage {
            Some(stage) => {
                info!(stage, version = %created.version, "Creating alias");
                let alias = self
                    .functions
                    .create_alias(&created.arn, stage, &created.version)
                    .map_err(|e| {
                        progress.fail(
                            DeployStep::CreateAlias,
                            format!(
                                "{}; deployment history {} was not written",
                                e,
                                history_path.display()
                            ),
                        )
                    })?;
                progress.remote(DeployStep::CreateAlias);
                Some(alias)
            }
            None => None,
        };

        let mut history = History::default();
        history.append(DeploymentRecord {
            lambda_version: created.version.clone(),
            module_version: spec.version.clone(),
            deployment_package: None,
            date: created.last_modified.clone(),
            user,
        });
        if let (Some(stage), Some(alias)) = (stage, &alias) {
            history.set_stage(stage, &alias.function_version, true);
        }
        history
            .save(&history_path)
            .map_err(|e| progress.fail(DeployStep::SaveHistory, error_chain(&e)))?;

        Ok(CreateOutcome {
            function,
            arn: created.arn,
            version: created.version,
            stage: stage.map(str::to_string),
            history_path,
        })
    }

    /// Push new code and configuration to an existing function.
    pub fn update(&self, spec_path: &Path, options: &DeployOptions) -> Result<UpdateOutcome> {
        let spec_path = resolve_spec_path(spec_path)?;
        let spec = FunctionSpec::load(&spec_path)?;
        let function = spec.function_name().to_string();
        let arn = required_arn(&spec)?;
        let history_path = History::path_for(&spec_path);
        let mut history = load_required_history(&history_path)?;

        let mut progress = Progress::default();
        let user = self.resolve_user(&mut progress)?;
        let archive = archive_name(&spec, options);
        let code = self.stage_archive(&spec, &archive, options, &mut progress)?;

        info!(function = %function, key = %code.key, "Updating lambda function code");
        let updated = self
            .functions
            .update_function_code(&UpdateCode {
                function: arn,
                code: &code,
                publish: spec.lambdaconfig.publish(),
            })
            .map_err(|e| progress.fail(DeployStep::UpdateCode, e))?;
        progress.remote(DeployStep::UpdateCode);

        let view = spec.lambdaconfig.update_view();
        self.functions
            .update_function_configuration(&UpdateConfiguration {
                function: arn,
                config: &view,
                vpc: spec.vpcconfig.as_ref(),
            })
            .map_err(|e| progress.fail(DeployStep::UpdateConfiguration, e))?;
        progress.remote(DeployStep::UpdateConfiguration);
        info!(function = %function, version = %updated.version, "Lambda function updated");

        if history.contains_version(&updated.version) {
            warn!(
                version = %updated.version,
                "Function service reported a version already in the history; is Publish disabled?"
            );
        }
        history.append(DeploymentRecord {
            lambda_version: updated.version.clone(),
            module_version: spec.version.clone(),
            deployment_package: Some(archive.clone()),
            date: updated.last_modified,
            user,
        });
        history
            .save(&history_path)
            .map_err(|e| progress.fail(DeployStep::SaveHistory, error_chain(&e)))?;

        Ok(UpdateOutcome {
            function,
            version: updated.version,
            archive,
            history_path,
        })
    }

    /// Point a stage alias at `version`, or at the latest published version
    /// when none is given.
    pub fn set_stage(
        &self,
        spec_path: &Path,
        stage: &str,
        version: Option<&str>,
    ) -> Result<StageOutcome> {
        let spec_path = resolve_spec_path(spec_path)?;
        let spec = FunctionSpec::load(&spec_path)?;
        let function = spec.function_name().to_string();
        let arn = required_arn(&spec)?;
        let history_path = History::path_for(&spec_path);
        let mut history = load_required_history(&history_path)?;

        let stage = non_empty(Some(stage.trim()), "stage")?.unwrap_or_default();
        let explicit = non_empty(version.map(str::trim), "version")?;

        let mut progress = Progress::default();
        let version = match explicit {
            Some(version) => version.to_string(),
            None => self.resolve_latest_version(arn, &mut progress)?,
        };

        let aliases = self
            .functions
            .list_aliases(arn)
            .map_err(|e| progress.fail(DeployStep::ListAliases, e))?;
        progress.done(DeployStep::ListAliases);
        let created = !aliases.iter().any(|alias| alias.name == stage);

        if created {
            info!(stage, version = %version, "Creating stage");
            self.functions
                .create_alias(arn, stage, &version)
                .map_err(|e| progress.fail(DeployStep::CreateAlias, e))?;
            progress.remote(DeployStep::CreateAlias);
        } else {
            info!(stage, version = %version, "Updating stage");
            self.functions
                .update_alias(arn, stage, &version)
                .map_err(|e| progress.fail(DeployStep::UpdateAlias, e))?;
            progress.remote(DeployStep::UpdateAlias);
        }

        history.set_stage(stage, &version, created);
        history
            .save(&history_path)
            .map_err(|e| progress.fail(DeployStep::SaveHistory, error_chain(&e)))?;

        Ok(StageOutcome {
            function,
            stage: stage.to_string(),
            version,
            created,
        })
    }

    fn resolve_user(&self, progress: &mut Progress) -> Result<String> {
        let user = self
            .identity
            .current_user()
            .map_err(|e| progress.fail(DeployStep::ResolveUser, e))?;
        progress.done(DeployStep::ResolveUser);
        Ok(user)
    }

    fn resolve_latest_version(&self, function: &str, progress: &mut Progress) -> Result<String> {
        let latest = latest_version(VersionPages::new(self.functions, function))
            .map_err(|e| progress.fail(DeployStep::ListVersions, e))?
            .ok_or_else(|| {
                progress.fail(
                    DeployStep::ListVersions,
                    format!("function '{}' has no published versions", function),
                )
            })?;
        progress.done(DeployStep::ListVersions);
        info!(version = %latest, "Resolved latest published version");
        Ok(latest)
    }

    /// Package and upload the archive unless `skip_upload` is set; returns
    /// where the function service should read the code from.
    fn stage_archive(
        &self,
        spec: &FunctionSpec,
        archive: &str,
        options: &DeployOptions,
        progress: &mut Progress,
    ) -> Result<CodeLocation> {
        let code = CodeLocation {
            bucket: spec.s3bucket.clone(),
            key: format!("{}{}", spec.s3keyprefix, archive),
        };

        if options.skip_upload {
            info!(key = %code.key, "Skipping packaging and upload");
            return Ok(code);
        }

        info!(archive, files = ?spec.files, "Creating distribution package");
        let body = self
            .packager
            .build(&PackageRequest {
                archive_base: &spec.zipfile,
                archive_name: archive,
                files: &spec.files,
            })
            .map_err(|e| progress.fail(DeployStep::Package, e))?;
        progress.done(DeployStep::Package);

        info!(archive, bucket = %code.bucket, key = %code.key, "Uploading package");
        self.store
            .upload(&UploadRequest {
                bucket: &code.bucket,
                key: &code.key,
                body: &body,
                profile: options.profile.as_deref(),
                region: options.region.as_deref(),
            })
            .map_err(|e| progress.fail(DeployStep::Upload, e))?;
        progress.done(DeployStep::Upload);

        Ok(code)
    }
}

fn resolve_spec_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DeployError::NotFound {
                kind: FileKind::Spec,
                path: path.to_path_buf(),
            }
        } else {
            DeployError::Io {
                action: "resolve",
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn required_arn(spec: &FunctionSpec) -> Result<&str> {
    spec.function_arn()
        .ok_or_else(|| DeployError::MissingIdentity {
            function: spec.function_name().to_string(),
        })
}

fn load_required_history(path: &Path) -> Result<History> {
    History::load(path).map_err(|e| match e {
        DeployError::NotFound { path, .. } => DeployError::MissingHistory { path },
        other => other,
    })
}

fn non_empty<'s>(value: Option<&'s str>, what: &str) -> Result<Option<&'s str>> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(DeployError::Usage(format!("{} must not be empty", what)))
        }
        other => Ok(other),
    }
}

fn archive_name(spec: &FunctionSpec, options: &DeployOptions) -> String {
    match &options.archive {
        Some(name) => name.clone(),
        None => format!(
            "{}_{}.zip",
            spec.zipfile,
            chrono::Utc::now().timestamp_millis()
        ),
    }
}

/// Flatten an error and its sources into one line for partial-failure reports.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
