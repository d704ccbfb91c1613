//! Function spec: the hand-authored descriptor for one deployable function.
//!
//! The file is edited by operators as well as by this tool, so every object
//! keeps the fields it does not model in a flattened map and writes them back
//! unchanged.

use crate::error::{DeployError, FileKind, Result};
use crate::persist;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

const FUNCTION_NAME: &str = "FunctionName";
const FUNCTION_ARN: &str = "FunctionArn";
const PUBLISH: &str = "Publish";

/// Keys the update-function-configuration call rejects.
const UPDATE_REJECTED_KEYS: &[&str] = &[FUNCTION_NAME, FUNCTION_ARN, PUBLISH];

/// Declarative descriptor for one function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Base name of the local archive; a timestamp and `.zip` are appended per deploy.
    pub zipfile: String,
    pub s3bucket: String,
    #[serde(default)]
    pub s3keyprefix: String,
    /// Caller-supplied module version, independent of the platform's version numbers.
    pub version: String,
    /// Path globs packaged into the archive.
    #[serde(default)]
    pub files: Vec<String>,
    pub lambdaconfig: FunctionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpcconfig: Option<VpcConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FunctionSpec {
    /// Load a spec file.
    ///
    /// Fails with [`DeployError::NotFound`] when the file is absent and
    /// [`DeployError::Parse`] when it is not a well-formed descriptor,
    /// including a `lambdaconfig` without a `FunctionName`.
    pub fn load(path: &Path) -> Result<Self> {
        let spec: FunctionSpec = persist::read_json(FileKind::Spec, path)?;
        if spec.lambdaconfig.function_name().is_none() {
            return Err(DeployError::Parse {
                kind: FileKind::Spec,
                path: path.to_path_buf(),
                reason: format!("lambdaconfig.{} is required", FUNCTION_NAME),
            });
        }
        Ok(spec)
    }

    /// Overwrite the spec file with this spec.
    pub fn save(&self, path: &Path) -> Result<()> {
        persist::write_json(path, self)
    }

    pub fn function_name(&self) -> &str {
        self.lambdaconfig.function_name().unwrap_or_default()
    }

    /// ARN assigned by the first successful create, if any.
    pub fn function_arn(&self) -> Option<&str> {
        self.lambdaconfig.function_arn()
    }
}

/// The `lambdaconfig` payload, sent verbatim to create-function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionConfig(Map<String, Value>);

impl FunctionConfig {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn function_name(&self) -> Option<&str> {
        self.0.get(FUNCTION_NAME).and_then(Value::as_str)
    }

    /// The resource ARN; an empty string counts as unset.
    pub fn function_arn(&self) -> Option<&str> {
        self.0
            .get(FUNCTION_ARN)
            .and_then(Value::as_str)
            .filter(|arn| !arn.is_empty())
    }

    pub fn set_function_arn(&mut self, arn: &str) {
        self.0
            .insert(FUNCTION_ARN.to_string(), Value::String(arn.to_string()));
    }

    /// Whether code updates should publish a new version.
    pub fn publish(&self) -> bool {
        self.0.get(PUBLISH).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Copy of this configuration without the keys update-function-configuration
    /// rejects. `self` is left untouched.
    pub fn update_view(&self) -> FunctionConfig {
        FunctionConfig(
            self.0
                .iter()
                .filter(|(key, _)| !UPDATE_REJECTED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Optional network placement for the function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConfig {
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Value {
        json!({
            "zipfile": "orders",
            "s3bucket": "deploy-artifacts",
            "s3keyprefix": "lambda/orders/",
            "version": "1.4.2",
            "files": ["dist/**", "config/*.json"],
            "lambdaconfig": {
                "FunctionName": "orders",
                "Handler": "dist/index.handler",
                "Runtime": "nodejs18.x",
                "MemorySize": 256,
                "Timeout": 30,
                "Publish": true
            },
            "vpcconfig": {
                "SubnetIds": ["subnet-1", "subnet-2"],
                "SecurityGroupIds": ["sg-1"]
            },
            "owner": "payments-team"
        })
    }

    fn write_sample(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("orders.json");
        fs::write(&path, serde_json::to_string_pretty(&sample()).unwrap()).unwrap();
        path
    }

    #[test]
    fn load_save_load_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);

        let first = FunctionSpec::load(&path).unwrap();
        first.save(&path).unwrap();
        let second = FunctionSpec::load(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.extra.get("owner"), Some(&json!("payments-team")));
        assert_eq!(second.lambdaconfig.as_map()["MemorySize"], json!(256));
        let vpc = second.vpcconfig.unwrap();
        assert_eq!(vpc.subnet_ids, vec!["subnet-1", "subnet-2"]);
        assert_eq!(vpc.security_group_ids, vec!["sg-1"]);
    }

    #[test]
    fn lambdaconfig_key_order_survives_save() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);

        FunctionSpec::load(&path).unwrap().save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let handler = text.find("\"Handler\"").unwrap();
        let runtime = text.find("\"Runtime\"").unwrap();
        let timeout = text.find("\"Timeout\"").unwrap();
        assert!(handler < runtime && runtime < timeout);
    }

    #[test]
    fn missing_function_name_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let mut value = sample();
        value["lambdaconfig"]
            .as_object_mut()
            .unwrap()
            .remove("FunctionName");
        fs::write(&path, value.to_string()).unwrap();

        let err = FunctionSpec::load(&path).unwrap_err();
        assert!(matches!(err, DeployError::Parse { .. }));
        assert!(err.to_string().contains("FunctionName"));
    }

    #[test]
    fn missing_spec_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = FunctionSpec::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, DeployError::NotFound { kind: FileKind::Spec, .. }));
    }

    #[test]
    fn empty_arn_counts_as_unset() {
        let mut config = FunctionConfig::new(
            json!({"FunctionName": "orders", "FunctionArn": ""})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(config.function_arn(), None);

        config.set_function_arn("arn:aws:lambda:eu-central-1:123:function:orders");
        assert_eq!(
            config.function_arn(),
            Some("arn:aws:lambda:eu-central-1:123:function:orders")
        );
    }

    #[test]
    fn update_view_strips_rejected_keys_without_touching_source() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let mut spec = FunctionSpec::load(&path).unwrap();
        spec.lambdaconfig.set_function_arn("arn:orders");

        let view = spec.lambdaconfig.update_view();
        assert!(!view.as_map().contains_key("FunctionName"));
        assert!(!view.as_map().contains_key("FunctionArn"));
        assert!(!view.as_map().contains_key("Publish"));
        assert_eq!(view.as_map()["Handler"], json!("dist/index.handler"));

        assert_eq!(spec.function_name(), "orders");
        assert_eq!(spec.function_arn(), Some("arn:orders"));
        assert!(spec.lambdaconfig.publish());
    }
}
