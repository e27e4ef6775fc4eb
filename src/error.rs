//! Error types for batchpush.
//!
//! Git invocation failures are [`ExecError`]; everything the reconciliation
//! layer can report to a caller is a [`ReconcileError`]. Config loading has
//! its own [`ConfigError`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors from running the git binary.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The configured git binary could not be found.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// git exited with a non-zero status.
    #[error("git {command} failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// git did not finish within the configured timeout and was killed.
    #[error("git {command} timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },

    #[error("git I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by divergence resolution, batch pushing and rollback.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Execution(#[from] ExecError),

    /// HEAD is detached or the repository has no branch to resolve.
    #[error("could not determine the current branch (detached HEAD or empty repository)")]
    BranchUnknown,

    /// Rollback needs HEAD to have a parent.
    #[error("no commit before HEAD: the repository has fewer than two commits")]
    InsufficientHistory,

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("push to {remote}/{branch} rejected: {detail}")]
    PushRejected {
        remote: String,
        branch: String,
        detail: String,
    },

    #[error("branch '{branch}' does not exist on remote '{remote}'")]
    RemoteBranchMissing { remote: String, branch: String },

    /// The remote tip is not the local HEAD, so the last push was not ours.
    #[error("{remote}/{branch} points at {remote_tip}, local HEAD is {local_head}; refusing to roll back")]
    RemoteDiverged {
        remote: String,
        branch: String,
        remote_tip: String,
        local_head: String,
    },
}

/// Errors from loading the TOML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
