//! Process seam for the `svn` binary.
//!
//! [`SvnRunner`] is the only place where svn is actually executed.
//! [`ProcessRunner`] spawns the real binary; tests substitute a scripted fake.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::SvnError;

/// Runs one svn subcommand to completion and returns its stdout.
///
/// A non-zero exit must be reported as [`SvnError::CommandFailed`].
#[allow(async_fn_in_trait)]
pub trait SvnRunner {
    async fn run(&self, args: &[&str]) -> Result<String, SvnError>;
}

/// Optional credentials appended to every svn invocation.
#[derive(Debug, Clone, Default)]
pub struct SvnAuth {
    pub username: Option<String>,
    pub password: Option<String>,
    pub non_interactive: bool,
}

impl SvnAuth {
    fn args(&self) -> Vec<&str> {
        let mut args = Vec::new();
        if self.non_interactive {
            args.push("--non-interactive");
        }
        if let Some(username) = &self.username {
            args.extend(["--username", username.as_str()]);
        }
        if let Some(password) = &self.password {
            args.extend(["--password", password.as_str(), "--no-auth-cache"]);
        }
        args
    }
}

/// Spawns the svn binary inside a working copy.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: String,
    workdir: PathBuf,
    auth: SvnAuth,
}

impl ProcessRunner {
    pub fn new(binary: impl Into<String>, workdir: impl Into<PathBuf>, auth: SvnAuth) -> Self {
        Self {
            binary: binary.into(),
            workdir: workdir.into(),
            auth,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl SvnRunner for ProcessRunner {
    async fn run(&self, args: &[&str]) -> Result<String, SvnError> {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.workdir)
            .args(args)
            .args(self.auth.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(cmd = %format!("{} {}", self.binary, args.join(" ")), "running svn command");
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SvnError::BinaryNotFound(self.binary.clone())
            } else {
                SvnError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "svn command failed");
            return Err(SvnError::CommandFailed { exit_code, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
