//! lambdeploy-shell - collaborator implementations that shell out to
//! `aws`, the configured build commands, `zip` and `git`.
//!
//! All process spawning goes through [`CommandRunner`], so each backend can
//! be exercised with a recording runner instead of real tools.

mod git;
mod lambda;
mod package;
mod runner;
mod s3;

pub use git::GitIdentity;
pub use lambda::AwsLambdaCli;
pub use package::NpmZipPackager;
pub use runner::{CommandRunner, Invocation, SystemRunner};
pub use s3::AwsS3Cli;
