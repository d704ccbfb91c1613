//! lambdeploy-core - deployment bookkeeping for a single serverless function
//!
//! Keeps three things consistent across invocations: the hand-authored spec
//! file, the append-only history ledger next to it, and the remote function.
//! External tools (packager, object store, function service, identity lookup)
//! are reached only through the traits in [`service`], so the flows in
//! [`deployer`] can run against fakes.
//!
//! ```ignore
//! let deployer = Deployer::new(&packager, &store, &functions, &identity);
//! let outcome = deployer.create(Path::new("orders.json"), &DeployOptions::default())?;
//! println!("created {} at version {}", outcome.arn, outcome.version);
//! ```

pub mod deployer;
pub mod error;
pub mod history;
mod persist;
pub mod service;
pub mod spec;
pub mod versions;

pub use deployer::{CreateOutcome, DeployOptions, Deployer, StageOutcome, UpdateOutcome};
pub use error::{DeployError, DeployStep, FileKind, Result, ServiceError, ServiceResult};
pub use history::{DeploymentRecord, History, StageHistory, HISTORY_SUFFIX};
pub use service::{
    AliasInfo, CodeLocation, CodeUpdated, CreateFunction, DeployerIdentity, FunctionCreated,
    FunctionService, ObjectStore, PackageBuilder, PackageRequest, UpdateCode,
    UpdateConfiguration, UploadRequest, VersionPage,
};
pub use spec::{FunctionConfig, FunctionSpec, VpcConfig};
pub use versions::{latest_version, VersionPages};
