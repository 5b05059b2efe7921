//! Invoking the package manager.
//!
//! Commands run to completion with stdout and stderr captured in full; the
//! exit code decides success.

use crate::error::{Error, Result};
use crate::paths::find_npm;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Package visibility on publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Restricted,
}

impl FromStr for Access {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Access::Public),
            "restricted" => Ok(Access::Restricted),
            other => Err(Error::InvalidAccess(other.to_string())),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => f.write_str("public"),
            Access::Restricted => f.write_str("restricted"),
        }
    }
}

/// Extra flags for `publish`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    pub access: Option<Access>,
    pub dry_run: bool,
    /// Registry to publish to, when it isn't npm's default.
    pub registry: Option<Url>,
}

impl PublishOptions {
    /// Arguments for `npm publish`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["publish".to_string()];
        if let Some(access) = self.access {
            args.push("--access".to_string());
            args.push(access.to_string());
        }
        if let Some(registry) = &self.registry {
            args.push("--registry".to_string());
            args.push(registry.to_string());
        }
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }
}

/// A package manager able to install and publish from a working directory.
pub trait PackageManager {
    /// Install `package` into `cwd`. Fails with [`Error::FetchFailed`].
    fn install(&self, package: &str, cwd: &Path) -> Result<CommandOutput>;

    /// Publish the package in `cwd`. Fails with [`Error::PublishFailed`].
    ///
    /// `package` is only used to describe the package in errors.
    fn publish(&self, package: &str, options: &PublishOptions, cwd: &Path) -> Result<CommandOutput>;
}

/// The `npm` command-line client.
///
/// Without an explicit program, `npm` is looked up on `PATH` each time a
/// command runs.
#[derive(Debug, Clone, Default)]
pub struct NpmCli {
    program: Option<PathBuf>,
}

impl NpmCli {
    /// Use the `npm` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        NpmCli {
            program: Some(program.into()),
        }
    }

    fn program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => find_npm(),
        }
    }

    fn run(&self, args: &[String], cwd: &Path) -> std::result::Result<CommandOutput, String> {
        let command = format!("npm {}", args.join(" "));
        debug!("Running `{}` in {}", command, cwd.display());

        let program = self.program().map_err(|e| e.to_string())?;
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| format!("failed to run `{}`: {}", command, e))?;

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("stdout:\n{}", captured.stdout);
        debug!("stderr:\n{}", captured.stderr);

        if output.status.success() {
            Ok(captured)
        } else {
            Err(format!(
                "`{}` exited with {}: {}",
                command,
                output.status,
                captured.stderr.trim()
            ))
        }
    }
}

impl PackageManager for NpmCli {
    fn install(&self, package: &str, cwd: &Path) -> Result<CommandOutput> {
        let args = vec!["install".to_string(), package.to_string()];
        self.run(&args, cwd).map_err(|message| Error::FetchFailed {
            package: package.to_string(),
            message,
        })
    }

    fn publish(&self, package: &str, options: &PublishOptions, cwd: &Path) -> Result<CommandOutput> {
        self.run(&options.to_args(), cwd)
            .map_err(|message| Error::PublishFailed {
                package: package.to_string(),
                message,
            })
    }
}
