use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::divergence::branch_or_current;
use super::{require_name, short_hash};
use crate::error::{ExecError, ReconcileError};
use crate::git::CommandExecutor;

/// Where the remote branch pointed before and after a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackOutcome {
    pub remote: String,
    pub branch: String,
    pub previous_tip: String,
    pub new_tip: String,
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} now points at {} (was {})",
            self.remote,
            self.branch,
            short_hash(&self.new_tip),
            short_hash(&self.previous_tip)
        )
    }
}

/// Move `remote`'s branch back to the parent of local HEAD.
///
/// The remote tip is observed first and the force update is conditional on
/// it being unchanged, so commits another client pushed in between are never
/// discarded.
#[instrument(skip(executor))]
pub async fn undo_last_push<E: CommandExecutor>(
    executor: &E,
    remote: &str,
    branch: Option<&str>,
) -> Result<RollbackOutcome, ReconcileError> {
    require_name("remote", remote)?;
    let branch = branch_or_current(executor, branch).await?;

    let previous = parent_of_head(executor).await?;
    let head = executor
        .run(&["rev-parse", "--verify", "HEAD"])
        .await?
        .stdout
        .trim()
        .to_string();

    let remote_ref = format!("refs/heads/{branch}");
    let observed = observe_remote_tip(executor, remote, &remote_ref)
        .await?
        .ok_or_else(|| ReconcileError::RemoteBranchMissing {
            remote: remote.to_string(),
            branch: branch.clone(),
        })?;

    if observed != head {
        warn!(%observed, %head, "remote tip is not local HEAD");
        return Err(ReconcileError::RemoteDiverged {
            remote: remote.to_string(),
            branch,
            remote_tip: observed,
            local_head: head,
        });
    }

    lease_guarded_update(executor, remote, &branch, &observed, &previous).await?;

    let outcome = RollbackOutcome {
        remote: remote.to_string(),
        branch,
        previous_tip: observed,
        new_tip: previous,
    };
    info!(%outcome, "rolled back last push");
    Ok(outcome)
}

/// The single parent of HEAD, or `InsufficientHistory` when there is none.
async fn parent_of_head<E: CommandExecutor>(executor: &E) -> Result<String, ReconcileError> {
    match executor
        .run(&["rev-parse", "--verify", "--quiet", "HEAD~1^{commit}"])
        .await
    {
        Ok(output) if !output.stdout.trim().is_empty() => Ok(output.stdout.trim().to_string()),
        Ok(_) | Err(ExecError::CommandFailed { .. }) => Err(ReconcileError::InsufficientHistory),
        Err(e) => Err(e.into()),
    }
}

/// Current hash of `remote_ref` on the remote itself, `None` if it does not exist.
async fn observe_remote_tip<E: CommandExecutor>(
    executor: &E,
    remote: &str,
    remote_ref: &str,
) -> Result<Option<String>, ReconcileError> {
    let output = executor.run(&["ls-remote", remote, remote_ref]).await?;

    // ls-remote matches patterns by suffix, so compare the ref name exactly.
    Ok(output.stdout.lines().find_map(|line| {
        let (hash, name) = line.split_once(char::is_whitespace)?;
        (name.trim() == remote_ref).then(|| hash.to_string())
    }))
}

/// Force `remote`'s `branch` to `target`, but only while it still points at
/// `expected`.
pub(crate) async fn lease_guarded_update<E: CommandExecutor>(
    executor: &E,
    remote: &str,
    branch: &str,
    expected: &str,
    target: &str,
) -> Result<(), ReconcileError> {
    let remote_ref = format!("refs/heads/{branch}");
    let lease = format!("--force-with-lease={remote_ref}:{expected}");
    let refspec = format!("{target}:{remote_ref}");

    match executor.run(&["push", &lease, remote, &refspec]).await {
        Ok(_) => Ok(()),
        Err(ExecError::CommandFailed { stderr, .. }) => Err(ReconcileError::PushRejected {
            remote: remote.to_string(),
            branch: branch.to_string(),
            detail: stderr,
        }),
        Err(e) => Err(e.into()),
    }
}
