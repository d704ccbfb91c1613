//! In-memory stand-ins for the external collaborators.
//!
//! `FakeCloud` implements every collaborator trait and records each call as a
//! short string so tests can assert on exactly what reached the "outside".

#![allow(dead_code)]

use lambdeploy_core::{
    AliasInfo, CodeUpdated, CreateFunction, DeployerIdentity, FunctionConfig, FunctionCreated,
    FunctionService, ObjectStore, PackageBuilder, PackageRequest, ServiceError, ServiceResult,
    UpdateCode, UpdateConfiguration, UploadRequest, VersionPage,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

pub const ARN: &str = "arn:aws:lambda:eu-central-1:123456789012:function:orders";
pub const LAST_MODIFIED: &str = "2026-10-18T09:00:00.000+0000";

pub struct FakeCloud {
    pub calls: RefCell<Vec<String>>,
    /// Version the next create/update-code call reports.
    pub next_version: Cell<u32>,
    pub aliases: RefCell<Vec<AliasInfo>>,
    /// Pages served by list_versions; the marker is the page index.
    pub version_pages: Vec<Vec<String>>,
    /// Call name that should fail, e.g. `"create_alias"`.
    pub fail_on: Option<&'static str>,
    pub last_configuration: RefCell<Option<FunctionConfig>>,
    pub user: Option<String>,
    /// When the named call arrives, replace this file with a directory so a
    /// later write to it fails.
    pub clobber_on: Option<(&'static str, PathBuf)>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_version: Cell::new(1),
            aliases: RefCell::new(Vec::new()),
            version_pages: Vec::new(),
            fail_on: None,
            last_configuration: RefCell::new(None),
            user: Some("octocat".to_string()),
            clobber_on: None,
        }
    }
}

impl FakeCloud {
    pub fn failing_on(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, name: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(name))
            .count()
    }

    fn record(&self, call: String) -> ServiceResult<()> {
        let name = call.split(' ').next().unwrap_or_default().to_string();
        self.calls.borrow_mut().push(call);
        if let Some((target, path)) = &self.clobber_on {
            if *target == name {
                fs::remove_file(path).unwrap();
                fs::create_dir(path).unwrap();
                fs::write(path.join("keep"), "").unwrap();
            }
        }
        if self.fail_on == Some(name.as_str()) {
            return Err(ServiceError::new(format!("{} rejected by fake", name)));
        }
        Ok(())
    }

    fn take_version(&self) -> String {
        let version = self.next_version.get();
        self.next_version.set(version + 1);
        version.to_string()
    }
}

impl PackageBuilder for FakeCloud {
    fn build(&self, request: &PackageRequest<'_>) -> ServiceResult<PathBuf> {
        self.record(format!("package {}", request.archive_name))?;
        Ok(PathBuf::from("/tmp").join(request.archive_name))
    }
}

impl ObjectStore for FakeCloud {
    fn upload(&self, request: &UploadRequest<'_>) -> ServiceResult<()> {
        self.record(format!(
            "upload {}/{} profile={} region={}",
            request.bucket,
            request.key,
            request.profile.unwrap_or("-"),
            request.region.unwrap_or("-")
        ))
    }
}

impl FunctionService for FakeCloud {
    fn create_function(&self, request: &CreateFunction<'_>) -> ServiceResult<FunctionCreated> {
        self.record(format!(
            "create_function {}/{}",
            request.code.bucket, request.code.key
        ))?;
        Ok(FunctionCreated {
            arn: ARN.to_string(),
            version: self.take_version(),
            last_modified: LAST_MODIFIED.to_string(),
        })
    }

    fn update_function_code(&self, request: &UpdateCode<'_>) -> ServiceResult<CodeUpdated> {
        self.record(format!(
            "update_function_code {} {}/{} publish={}",
            request.function, request.code.bucket, request.code.key, request.publish
        ))?;
        Ok(CodeUpdated {
            version: self.take_version(),
            last_modified: LAST_MODIFIED.to_string(),
        })
    }

    fn update_function_configuration(
        &self,
        request: &UpdateConfiguration<'_>,
    ) -> ServiceResult<()> {
        self.record(format!("update_function_configuration {}", request.function))?;
        *self.last_configuration.borrow_mut() = Some(request.config.clone());
        Ok(())
    }

    fn list_versions(&self, function: &str, marker: Option<&str>) -> ServiceResult<VersionPage> {
        self.record(format!(
            "list_versions {} marker={}",
            function,
            marker.unwrap_or("-")
        ))?;
        let index: usize = marker.map(|m| m.parse().unwrap()).unwrap_or(0);
        let next = index + 1;
        Ok(VersionPage {
            versions: self.version_pages.get(index).cloned().unwrap_or_default(),
            next_marker: (next < self.version_pages.len()).then(|| next.to_string()),
        })
    }

    fn list_aliases(&self, function: &str) -> ServiceResult<Vec<AliasInfo>> {
        self.record(format!("list_aliases {}", function))?;
        Ok(self.aliases.borrow().clone())
    }

    fn create_alias(&self, function: &str, name: &str, version: &str) -> ServiceResult<AliasInfo> {
        self.record(format!("create_alias {} {} {}", function, name, version))?;
        let alias = AliasInfo {
            name: name.to_string(),
            function_version: version.to_string(),
        };
        self.aliases.borrow_mut().push(alias.clone());
        Ok(alias)
    }

    fn update_alias(&self, function: &str, name: &str, version: &str) -> ServiceResult<AliasInfo> {
        self.record(format!("update_alias {} {} {}", function, name, version))?;
        let mut aliases = self.aliases.borrow_mut();
        let alias = aliases
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| ServiceError::new("ResourceNotFoundException"))?;
        alias.function_version = version.to_string();
        Ok(alias.clone())
    }
}

impl DeployerIdentity for FakeCloud {
    fn current_user(&self) -> ServiceResult<String> {
        self.user
            .clone()
            .ok_or_else(|| ServiceError::new("git config github.user returned nothing"))
    }
}

pub fn spec_json(arn: Option<&str>) -> Value {
    let mut lambdaconfig = json!({
        "FunctionName": "orders",
        "Role": "arn:aws:iam::123456789012:role/orders-lambda",
        "Handler": "dist/index.handler",
        "Runtime": "nodejs18.x",
        "MemorySize": 256,
        "Timeout": 30,
        "Publish": true
    });
    if let Some(arn) = arn {
        lambdaconfig["FunctionArn"] = json!(arn);
    }
    json!({
        "zipfile": "orders",
        "s3bucket": "artifacts",
        "s3keyprefix": "lambda/orders/",
        "version": "2.3.0",
        "files": ["dist/**"],
        "lambdaconfig": lambdaconfig,
        "vpcconfig": {
            "SubnetIds": ["subnet-a", "subnet-b"],
            "SecurityGroupIds": ["sg-1"]
        },
        "notes": "hand edited"
    })
}

pub fn write_spec(dir: &Path, arn: Option<&str>) -> PathBuf {
    let path = dir.join("orders.json");
    fs::write(&path, serde_json::to_string_pretty(&spec_json(arn)).unwrap()).unwrap();
    path
}

pub fn write_history(dir: &Path, history: Value) -> PathBuf {
    let path = dir.join("orders-history.json");
    fs::write(&path, serde_json::to_string_pretty(&history).unwrap()).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
