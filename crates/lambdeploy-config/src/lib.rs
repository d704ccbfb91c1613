// lambdeploy-config - Tool configuration for the lambdeploy CLI
//
// Supports configuration from multiple sources:
// 1. Command-line flags (applied by the binary, highest priority)
// 2. Environment variables (LAMBDEPLOY_* prefix)
// 3. Config file: --config, then LAMBDEPLOY_CONFIG, then ./lambdeploy.toml or ./.lambdeploy.toml
// 4. Built-in defaults (lowest priority)
//
// This is configuration for the tool itself. The per-function descriptor
// (the "spec" file) lives in lambdeploy-core.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};

/// Main tool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub aws: AwsConfig,
    pub package: PackageConfig,
    pub identity: IdentityConfig,
    pub log: LogConfig,
}

/// How to reach AWS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// AWS CLI binary
    pub cli: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            cli: "aws".to_string(),
            profile: None,
            region: None,
        }
    }
}

/// Packaging pipeline run before each upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Commands run in order before zipping, each as an argv list
    pub commands: Vec<Vec<String>>,
    /// Paths zipped alongside the spec's `files`
    pub include: Vec<String>,
    /// zip binary
    pub zip: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        let argv = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        Self {
            commands: vec![
                argv(&["npm", "update", "-S"]),
                argv(&["npm", "update", "-D"]),
                argv(&["npm", "run", "compile"]),
                argv(&["npm", "prune", "--production"]),
            ],
            include: vec!["package.json".to_string(), "node_modules".to_string()],
            zip: "zip".to_string(),
        }
    }
}

/// Where the deploying user's name comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Key passed to `git config`
    pub git_key: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            git_key: "github.user".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl DeployConfig {
    /// Load configuration from all sources with priority.
    ///
    /// `explicit` is the `--config` flag; when given, the file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        sources::load_config(explicit, &sources::StdEnvSource)
    }

    /// Load configuration with a caller-supplied environment (useful for testing)
    pub fn load_with_env<E: EnvSource>(explicit: Option<&Path>, env: &E) -> Result<Self> {
        sources::load_config(explicit, env)
    }

    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
