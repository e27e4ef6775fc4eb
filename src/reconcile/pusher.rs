use tracing::{debug, warn};

use super::{require_name, Batch};
use crate::error::{ExecError, ReconcileError};
use crate::git::CommandExecutor;

/// Substrings that mark a push as failed even when git exited 0.
const FAILURE_MARKERS: &[&str] = &["fatal:", "error:", "! [rejected]", "! [remote rejected]"];

/// Advance `remote`'s `branch` to the tip of `batch`.
///
/// Only the tip hash is pushed: it carries every earlier commit of the batch,
/// and of any batch already delivered, along with it.
pub async fn push_batch<E: CommandExecutor>(
    executor: &E,
    batch: &Batch,
    remote: &str,
    branch: &str,
) -> Result<(), ReconcileError> {
    require_name("remote", remote)?;
    require_name("branch", branch)?;

    let refspec = format!("{}:refs/heads/{branch}", batch.tip().hash);
    debug!(batch = batch.index(), %refspec, "pushing batch tip");

    let rejected = |detail: String| ReconcileError::PushRejected {
        remote: remote.to_string(),
        branch: branch.to_string(),
        detail,
    };

    let output = match executor.run(&["push", remote, &refspec]).await {
        Ok(output) => output,
        Err(ExecError::CommandFailed { stderr, .. }) => return Err(rejected(stderr)),
        Err(e) => return Err(e.into()),
    };

    let combined = output.combined();
    if let Some(marker) = failure_marker(&combined) {
        warn!(batch = batch.index(), marker, "push exited 0 but reported a failure");
        return Err(rejected(combined.trim().to_string()));
    }

    Ok(())
}

fn failure_marker(output: &str) -> Option<&'static str> {
    let lowered = output.to_lowercase();
    FAILURE_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}
