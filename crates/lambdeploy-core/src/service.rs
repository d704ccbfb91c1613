//! Capability traits for the external collaborators a deployment talks to.
//!
//! Each call is synchronous and either returns a structured result or a
//! [`ServiceError`] carrying the underlying tool's message. The shipped
//! implementations shell out to `aws`, `npm`, `zip` and `git`; tests use
//! in-memory fakes.

use crate::error::ServiceResult;
use crate::spec::{FunctionConfig, VpcConfig};
use std::path::{Path, PathBuf};

/// Bucket and key an archive lives at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    /// Base name from the spec; stale `<base>_*.zip` archives may be cleaned up.
    pub archive_base: &'a str,
    /// File name of the archive to produce, e.g. `orders_1760778000000.zip`.
    pub archive_name: &'a str,
    pub files: &'a [String],
}

/// Builds a deployable archive on local disk.
pub trait PackageBuilder {
    /// Returns the path of the archive it produced.
    fn build(&self, request: &PackageRequest<'_>) -> ServiceResult<PathBuf>;
}

#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: &'a Path,
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
}

/// Blob store the archive is uploaded to.
pub trait ObjectStore {
    fn upload(&self, request: &UploadRequest<'_>) -> ServiceResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct CreateFunction<'a> {
    pub code: &'a CodeLocation,
    pub config: &'a FunctionConfig,
    pub vpc: Option<&'a VpcConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCreated {
    pub arn: String,
    pub version: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateCode<'a> {
    pub function: &'a str,
    pub code: &'a CodeLocation,
    pub publish: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUpdated {
    pub version: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateConfiguration<'a> {
    pub function: &'a str,
    pub config: &'a FunctionConfig,
    pub vpc: Option<&'a VpcConfig>,
}

/// One page of a function's published versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub versions: Vec<String>,
    /// Continuation marker; `None` on the final page.
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasInfo {
    pub name: String,
    pub function_version: String,
}

/// Control API of the remote compute platform.
///
/// `function` arguments accept a function name or ARN.
pub trait FunctionService {
    fn create_function(&self, request: &CreateFunction<'_>) -> ServiceResult<FunctionCreated>;

    fn update_function_code(&self, request: &UpdateCode<'_>) -> ServiceResult<CodeUpdated>;

    fn update_function_configuration(
        &self,
        request: &UpdateConfiguration<'_>,
    ) -> ServiceResult<()>;

    fn list_versions(&self, function: &str, marker: Option<&str>) -> ServiceResult<VersionPage>;

    fn list_aliases(&self, function: &str) -> ServiceResult<Vec<AliasInfo>>;

    fn create_alias(&self, function: &str, name: &str, version: &str)
        -> ServiceResult<AliasInfo>;

    fn update_alias(&self, function: &str, name: &str, version: &str)
        -> ServiceResult<AliasInfo>;
}

/// Who is deploying, for the history ledger.
pub trait DeployerIdentity {
    fn current_user(&self) -> ServiceResult<String>;
}
