//! Incremental push reconciliation.
//!
//! - `divergence`: which local commits the remote branch is missing
//! - `planner`: split those commits into ordered batches
//! - `pusher`: advance the remote branch to the tip of one batch
//! - `session`: deliver batches one after another under a failure policy
//! - `rollback`: move the remote branch back one commit, lease-guarded

pub mod divergence;
pub mod planner;
pub mod pusher;
pub mod rollback;
pub mod session;

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

pub use divergence::{current_branch, parse_commit_line, resolve, DivergenceSet};
pub use planner::plan;
pub use pusher::push_batch;
pub use rollback::{undo_last_push, RollbackOutcome};
pub use session::{
    BatchOutcome, BatchStatus, Confirm, Outcome, ProgressSink, PushReport, PushSession,
    SessionEvent, SessionState,
};

/// A commit as reported by `git log`. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// First seven characters of the hash, for display only.
    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }
}

pub(crate) fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// Reject blank names and names git would read as an option.
pub(crate) fn require_name(field: &'static str, value: &str) -> Result<(), ReconcileError> {
    if value.trim().is_empty() {
        return Err(ReconcileError::Validation {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.starts_with('-') {
        return Err(ReconcileError::Validation {
            field,
            reason: format!("'{value}' must not start with '-'"),
        });
    }
    Ok(())
}

/// Contiguous slice of a divergence set, pushed as one unit. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    index: usize,
    commits: Vec<Commit>,
}

impl Batch {
    /// Zero-based position of the batch within its plan.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// The newest commit of the batch; pushing it carries every earlier one.
    pub fn tip(&self) -> &Commit {
        self.commits
            .last()
            .expect("planner never produces an empty batch")
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.commits.len()
    }
}

/// Number of commits per batch, at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self, ReconcileError> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| ReconcileError::Validation {
                field: "batch size",
                reason: "must be greater than 0".to_string(),
            })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl FromStr for BatchSize {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let size = s
            .trim()
            .parse::<usize>()
            .map_err(|_| ReconcileError::Validation {
                field: "batch size",
                reason: format!("'{}' is not a whole number", s.trim()),
            })?;
        Self::new(size)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a push session does after a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// End the session; later batches are not attempted.
    #[default]
    #[serde(rename = "stop")]
    StopOnFailure,
    /// Ask whether to go on with the next batch.
    #[serde(rename = "ask")]
    ContinueWithConfirmation,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(Self::StopOnFailure),
            "ask" => Ok(Self::ContinueWithConfirmation),
            other => Err(format!("unknown failure policy '{other}' (expected stop or ask)")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StopOnFailure => write!(f, "stop"),
            Self::ContinueWithConfirmation => write!(f, "ask"),
        }
    }
}
