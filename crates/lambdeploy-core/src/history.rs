//! Deployment history: the append-only ledger kept next to each spec.

use crate::error::{FileKind, Result};
use crate::persist;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Appended to the spec's file stem to name its history file.
pub const HISTORY_SUFFIX: &str = "-history.json";

/// Ledger of deployments and stage pointers for one spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Deployment records in deployment order.
    #[serde(default)]
    pub versions: Vec<DeploymentRecord>,
    /// Stage name to the versions that stage has pointed at.
    #[serde(default)]
    pub aliases: BTreeMap<String, StageHistory>,
}

/// One successful create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// Version assigned by the function service.
    pub lambda_version: String,
    /// The spec's `version` at deploy time.
    pub module_version: String,
    /// Archive name; only recorded by updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_package: Option<String>,
    /// `LastModified` as reported by the function service.
    pub date: String,
    pub user: String,
}

/// Where a stage points now and every version it has pointed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHistory {
    pub current: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl StageHistory {
    pub fn new(version: &str) -> Self {
        Self {
            current: version.to_string(),
            versions: vec![version.to_string()],
        }
    }

    /// Point the stage at `version`, recording it once.
    pub fn point_to(&mut self, version: &str) {
        self.current = version.to_string();
        if !self.versions.iter().any(|v| v == version) {
            self.versions.push(version.to_string());
        }
    }
}

impl History {
    /// `<dir>/<stem>-history.json` for a spec at `<dir>/<stem>.<ext>`.
    pub fn path_for(spec_path: &Path) -> PathBuf {
        let stem = spec_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        spec_path.with_file_name(format!("{}{}", stem, HISTORY_SUFFIX))
    }

    /// Load a history file; [`crate::DeployError::NotFound`] when absent.
    pub fn load(path: &Path) -> Result<Self> {
        persist::read_json(FileKind::History, path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persist::write_json(path, self)
    }

    pub fn append(&mut self, record: DeploymentRecord) {
        self.versions.push(record);
    }

    /// Record a stage pointer change.
    ///
    /// A freshly created alias replaces whatever the ledger held for that
    /// stage; an updated alias keeps its previous versions.
    pub fn set_stage(&mut self, stage: &str, version: &str, created: bool) {
        if created {
            self.aliases
                .insert(stage.to_string(), StageHistory::new(version));
        } else {
            self.aliases
                .entry(stage.to_string())
                .or_default()
                .point_to(version);
        }
    }

    pub fn contains_version(&self, version: &str) -> bool {
        self.versions.iter().any(|r| r.lambda_version == version)
    }

    pub fn latest(&self) -> Option<&DeploymentRecord> {
        self.versions.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(version: &str) -> DeploymentRecord {
        DeploymentRecord {
            lambda_version: version.to_string(),
            module_version: "1.0.0".to_string(),
            deployment_package: None,
            date: "2026-10-18T09:00:00.000+0000".to_string(),
            user: "octocat".to_string(),
        }
    }

    #[test]
    fn history_path_replaces_extension() {
        assert_eq!(
            History::path_for(Path::new("/specs/orders.json")),
            PathBuf::from("/specs/orders-history.json")
        );
        assert_eq!(
            History::path_for(Path::new("specs/orders")),
            PathBuf::from("specs/orders-history.json")
        );
    }

    #[test]
    fn append_preserves_order() {
        let mut history = History::default();
        history.append(record("1"));
        history.append(record("2"));
        history.append(record("3"));

        let versions: Vec<_> = history
            .versions
            .iter()
            .map(|r| r.lambda_version.as_str())
            .collect();
        assert_eq!(versions, ["1", "2", "3"]);
        assert_eq!(history.latest().unwrap().lambda_version, "3");
    }

    #[test]
    fn stage_versions_stay_unique() {
        let mut history = History::default();
        history.set_stage("prod", "3", true);
        history.set_stage("prod", "4", false);
        history.set_stage("prod", "3", false);

        let prod = &history.aliases["prod"];
        assert_eq!(prod.current, "3");
        assert_eq!(prod.versions, ["3", "4"]);
    }

    #[test]
    fn updating_unknown_stage_starts_a_fresh_entry() {
        let mut history = History::default();
        history.set_stage("staging", "7", false);
        assert_eq!(history.aliases["staging"], StageHistory::new("7"));
    }

    #[test]
    fn created_stage_replaces_stale_entry() {
        let mut history = History::default();
        history.set_stage("dev", "1", true);
        history.set_stage("dev", "2", false);
        history.set_stage("dev", "5", true);
        assert_eq!(history.aliases["dev"], StageHistory::new("5"));
    }

    #[test]
    fn serialized_shape_matches_ledger_format() {
        let mut history = History::default();
        history.append(record("1"));
        let mut update = record("2");
        update.deployment_package = Some("orders_1760778000000.zip".to_string());
        history.append(update);
        history.set_stage("prod", "1", true);

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(
            value,
            json!({
                "versions": [
                    {
                        "lambdaVersion": "1",
                        "moduleVersion": "1.0.0",
                        "date": "2026-10-18T09:00:00.000+0000",
                        "user": "octocat"
                    },
                    {
                        "lambdaVersion": "2",
                        "moduleVersion": "1.0.0",
                        "deploymentPackage": "orders_1760778000000.zip",
                        "date": "2026-10-18T09:00:00.000+0000",
                        "user": "octocat"
                    }
                ],
                "aliases": {
                    "prod": {"current": "1", "versions": ["1"]}
                }
            })
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders-history.json");
        let mut history = History::default();
        history.append(record("9"));
        history.set_stage("prod", "9", true);

        history.save(&path).unwrap();
        assert_eq!(History::load(&path).unwrap(), history);
    }

    #[test]
    fn missing_history_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = History::load(&dir.path().join("orders-history.json")).unwrap_err();
        assert!(matches!(
            err,
            DeployError::NotFound {
                kind: FileKind::History,
                ..
            }
        ));
    }
}
