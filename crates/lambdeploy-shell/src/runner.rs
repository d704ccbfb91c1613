//! Running external programs.
//!
//! Every collaborator in this crate builds an [`Invocation`] and hands it to a
//! [`CommandRunner`]; the system runner spawns the process and waits for it,
//! tests substitute a recorder.

use lambdeploy_core::{ServiceError, ServiceResult};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// A program and its arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` when `value` is set.
    pub fn opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs an invocation to completion and returns its stdout.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> ServiceResult<String>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> ServiceResult<String> {
        (**self).run(invocation)
    }
}

/// Spawns real processes, blocking until each exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ServiceResult<String> {
        debug!(command = %invocation, "Running external command");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| {
            ServiceError::new(format!("failed to run '{}': {}", invocation.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(ServiceError::new(format!(
                "'{}' exited with {}{}{}",
                invocation.program,
                output.status,
                if detail.is_empty() { "" } else { ": " },
                detail
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
