//! Running git as a subprocess.
//!
//! Everything batchpush does to a repository goes through
//! [`CommandExecutor::run`]. The production implementation is [`GitCli`];
//! tests substitute a scripted double.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::GitSettings;
use crate::error::ExecError;

/// Captured output of a git invocation that exited successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr. git push reports most of its status on stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !self.stderr.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Runs one git command and reports its outcome.
///
/// A non-zero exit is always an error. A zero exit with empty output is a
/// success. Implementations never retry.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    async fn run(&self, args: &[&str]) -> Result<ExecOutput, ExecError>;
}

/// [`CommandExecutor`] backed by the git binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
    workdir: PathBuf,
    locale: String,
    timeout: Option<Duration>,
}

impl GitCli {
    /// Run `git` from `PATH` inside `workdir` with the default settings.
    pub fn new<P: AsRef<Path>>(workdir: P) -> Self {
        Self::from_settings(workdir, &GitSettings::default())
    }

    pub fn from_settings<P: AsRef<Path>>(workdir: P, settings: &GitSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            workdir: workdir.as_ref().to_path_buf(),
            locale: settings.locale.clone(),
            timeout: settings.timeout(),
        }
    }
}

impl CommandExecutor for GitCli {
    async fn run(&self, args: &[&str]) -> Result<ExecOutput, ExecError> {
        let command = args.first().copied().unwrap_or_default().to_string();

        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.workdir)
            .args(args)
            // Pin the locale so output is UTF-8 and failure markers are in English.
            .env("LANG", &self.locale)
            .env("LC_ALL", &self.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(cmd = %format!("{} {}", self.binary, args.join(" ")), "running git command");

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    warn!(%command, secs = limit.as_secs(), "git command timed out");
                    ExecError::TimedOut {
                        command: command.clone(),
                        secs: limit.as_secs(),
                    }
                })?,
            None => cmd.output().await,
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExecError::BinaryNotFound(self.binary.clone())
            } else {
                ExecError::Io(e)
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(%command, exit_code, stderr = %stderr.trim(), "git command failed");
            return Err(ExecError::CommandFailed {
                command,
                exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ExecOutput { stdout, stderr })
    }
}
