//! Error types for deployment flows.
//!
//! Every variant that involves an external collaborator records the
//! [`DeployStep`] that failed so the operator can tell where a flow stopped.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The individual steps a create, update or set-stage flow walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployStep {
    ResolveUser,
    Package,
    Upload,
    CreateFunction,
    SaveSpec,
    CreateAlias,
    UpdateCode,
    UpdateConfiguration,
    ListVersions,
    ListAliases,
    UpdateAlias,
    SaveHistory,
}

impl DeployStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveUser => "resolve-user",
            Self::Package => "package",
            Self::Upload => "upload",
            Self::CreateFunction => "create-function",
            Self::SaveSpec => "save-spec",
            Self::CreateAlias => "create-alias",
            Self::UpdateCode => "update-function-code",
            Self::UpdateConfiguration => "update-function-configuration",
            Self::ListVersions => "list-versions",
            Self::ListAliases => "list-aliases",
            Self::UpdateAlias => "update-alias",
            Self::SaveHistory => "save-history",
        }
    }
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which local state file an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spec,
    History,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Spec => write!(f, "spec"),
            FileKind::History => write!(f, "history"),
        }
    }
}

/// Failure reported by an external collaborator (packager, object store,
/// function service or identity lookup).
///
/// Carries the underlying tool's human-readable message only; the
/// orchestrator attaches the step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result alias for collaborator calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("{kind} file not found: {}", .path.display())]
    NotFound { kind: FileKind, path: PathBuf },

    #[error("malformed {kind} file {}: {reason}", .path.display())]
    Parse {
        kind: FileKind,
        path: PathBuf,
        reason: String,
    },

    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("function '{function}' has no FunctionArn in its spec; run `create` first")]
    MissingIdentity { function: String },

    #[error("no deployment history at {}; run `create` first", .path.display())]
    MissingHistory { path: PathBuf },

    #[error("{step} failed: {message}")]
    ExternalCall { step: DeployStep, message: String },

    #[error(
        "{step} failed after [{}] completed; local and remote state need manual reconciliation: {message}",
        join_steps(.completed)
    )]
    PartialFailure {
        step: DeployStep,
        completed: Vec<DeployStep>,
        message: String,
    },
}

fn join_steps(steps: &[DeployStep]) -> String {
    steps
        .iter()
        .map(DeployStep::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DeployError {
    /// Whether the flow stopped after a remote mutation had already happened.
    pub fn is_partial(&self) -> bool {
        matches!(self, DeployError::PartialFailure { .. })
    }

    /// The step that failed, for errors raised while talking to collaborators.
    pub fn step(&self) -> Option<DeployStep> {
        match self {
            DeployError::ExternalCall { step, .. } | DeployError::PartialFailure { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }
}

/// Result type alias for DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::ExternalCall {
            step: DeployStep::UpdateCode,
            message: "AccessDenied".to_string(),
        };
        assert_eq!(err.to_string(), "update-function-code failed: AccessDenied");

        let err = DeployError::MissingIdentity {
            function: "orders".to_string(),
        };
        assert!(err.to_string().contains("'orders'"));
        assert!(err.to_string().contains("FunctionArn"));

        let err = DeployError::NotFound {
            kind: FileKind::History,
            path: PathBuf::from("/tmp/orders-history.json"),
        };
        assert_eq!(
            err.to_string(),
            "history file not found: /tmp/orders-history.json"
        );
    }

    #[test]
    fn test_partial_failure_lists_completed_steps() {
        let err = DeployError::PartialFailure {
            step: DeployStep::UpdateConfiguration,
            completed: vec![DeployStep::Upload, DeployStep::UpdateCode],
            message: "InvalidParameterValueException".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("update-function-configuration failed after [upload, update-function-code]"));
        assert!(text.ends_with("InvalidParameterValueException"));
        assert!(err.is_partial());
        assert_eq!(err.step(), Some(DeployStep::UpdateConfiguration));
    }

    #[test]
    fn test_step_only_for_collaborator_errors() {
        assert_eq!(DeployError::Usage("x".into()).step(), None);
        assert!(!DeployError::AlreadyExists("x".into()).is_partial());
    }
}
