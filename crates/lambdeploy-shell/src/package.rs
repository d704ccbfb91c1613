//! Build-then-zip packaging of the function's working directory.

use crate::runner::{CommandRunner, Invocation, SystemRunner};
use glob::Pattern;
use lambdeploy_config::PackageConfig;
use lambdeploy_core::{PackageBuilder, PackageRequest, ServiceError, ServiceResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runs the configured build commands in `workdir`, then zips the spec's
/// files plus the configured include list into `<workdir>/<archive>`.
#[derive(Debug, Clone)]
pub struct NpmZipPackager<R = SystemRunner> {
    runner: R,
    workdir: PathBuf,
    commands: Vec<Vec<String>>,
    include: Vec<String>,
    zip: String,
}

impl NpmZipPackager<SystemRunner> {
    pub fn from_config(config: &PackageConfig, workdir: impl Into<PathBuf>) -> Self {
        Self::with_runner(SystemRunner, config, workdir)
    }
}

impl<R: CommandRunner> NpmZipPackager<R> {
    pub fn with_runner(runner: R, config: &PackageConfig, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            commands: config.commands.clone(),
            include: config.include.clone(),
            zip: config.zip.clone(),
        }
    }

    /// Delete archives left behind by earlier runs for the same base name.
    fn remove_stale_archives(&self, base: &str) -> ServiceResult<()> {
        let pattern = format!("{}_*.zip", Pattern::escape(base));
        for path in self.expand(&pattern)? {
            let path = self.workdir.join(path);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed stale archive"),
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove stale archive"),
            }
        }
        Ok(())
    }

    fn run_build_commands(&self) -> ServiceResult<()> {
        for argv in &self.commands {
            let Some((program, args)) = argv.split_first() else {
                continue;
            };
            let invocation = Invocation::new(program)
                .args(args.iter().cloned())
                .current_dir(&self.workdir);
            info!(command = %invocation, "Running build step");
            self.runner.run(&invocation)?;
        }
        Ok(())
    }

    /// Expand a pattern relative to the working directory, returning paths
    /// relative to it.
    fn expand(&self, pattern: &str) -> ServiceResult<Vec<String>> {
        let base = Pattern::escape(&self.workdir.to_string_lossy());
        let full = Path::new(&base).join(pattern);
        let entries = glob::glob(&full.to_string_lossy())
            .map_err(|e| ServiceError::new(format!("invalid file pattern '{}': {}", pattern, e)))?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ServiceError::new(format!("cannot read {}", e)))?;
            matches.push(relative_to(&self.workdir, &path));
        }
        Ok(matches)
    }

    /// Everything that goes into the archive, in order, without duplicates.
    fn archive_entries(&self, files: &[String]) -> ServiceResult<Vec<String>> {
        let mut entries: Vec<String> = Vec::new();
        for pattern in files {
            let matches = self.expand(pattern)?;
            if matches.is_empty() {
                warn!(pattern = %pattern, "File pattern matched nothing");
            }
            push_unique(&mut entries, matches);
        }

        for name in &self.include {
            if self.workdir.join(name).exists() {
                push_unique(&mut entries, [name.clone()]);
            } else {
                warn!(path = %name, "Included path does not exist, skipping");
            }
        }
        Ok(entries)
    }
}

fn relative_to(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn push_unique(entries: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !entries.contains(&item) {
            entries.push(item);
        }
    }
}

impl<R: CommandRunner> PackageBuilder for NpmZipPackager<R> {
    fn build(&self, request: &PackageRequest<'_>) -> ServiceResult<PathBuf> {
        self.remove_stale_archives(request.archive_base)?;
        self.run_build_commands()?;

        let entries = self.archive_entries(request.files)?;
        if entries.is_empty() {
            return Err(ServiceError::new(format!(
                "nothing to package for {}: no files matched",
                request.archive_name
            )));
        }

        let invocation = Invocation::new(&self.zip)
            .args(["-r", "-q", request.archive_name])
            .args(entries)
            .current_dir(&self.workdir);
        debug!(command = %invocation, "Zipping package");
        self.runner.run(&invocation)?;

        Ok(self.workdir.join(request.archive_name))
    }
}
