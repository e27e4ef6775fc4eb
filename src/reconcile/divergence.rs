use tracing::{debug, info, instrument};

use super::{require_name, Commit};
use crate::error::{ExecError, ReconcileError};
use crate::git::CommandExecutor;

/// Commits reachable from local HEAD but not from the remote-tracking branch,
/// oldest first. Empty means there is nothing to deliver.
pub type DivergenceSet = Vec<Commit>;

/// Name of the checked-out branch.
///
/// Fails with [`ReconcileError::BranchUnknown`] on a detached HEAD.
pub async fn current_branch<E: CommandExecutor>(executor: &E) -> Result<String, ReconcileError> {
    let output = executor.run(&["branch", "--show-current"]).await?;
    let branch = output.stdout.trim();
    if branch.is_empty() {
        return Err(ReconcileError::BranchUnknown);
    }
    Ok(branch.to_string())
}

/// Use `branch` when given and non-blank, otherwise ask git for the current one.
pub(crate) async fn branch_or_current<E: CommandExecutor>(
    executor: &E,
    branch: Option<&str>,
) -> Result<String, ReconcileError> {
    match branch.map(str::trim).filter(|b| !b.is_empty()) {
        Some(branch) => {
            require_name("branch", branch)?;
            Ok(branch.to_string())
        }
        None => current_branch(executor).await,
    }
}

/// Compute the commits `remote/branch` is missing, oldest first.
///
/// Always fetches `remote` first so the comparison is against fresh
/// remote-tracking state. A branch that has never been pushed has no
/// tracking ref; its pending commits are those no ref of `remote` reaches,
/// or all of HEAD when the remote has no refs at all.
#[instrument(skip(executor))]
pub async fn resolve<E: CommandExecutor>(
    executor: &E,
    remote: &str,
    branch: Option<&str>,
) -> Result<DivergenceSet, ReconcileError> {
    require_name("remote", remote)?;
    let branch = branch_or_current(executor, branch).await?;

    executor.run(&["fetch", remote]).await?;

    let tracking = format!("refs/remotes/{remote}/{branch}");
    let exclude_remote = format!("--remotes={remote}");
    let range: Vec<String> = if ref_exists(executor, &tracking).await? {
        vec![format!("{tracking}..HEAD")]
    } else if has_tracking_refs(executor, remote).await? {
        debug!(%tracking, "branch not on remote, excluding everything the remote has");
        vec!["HEAD".to_string(), "--not".to_string(), exclude_remote]
    } else {
        debug!(%remote, "remote has no refs, treating all of HEAD as pending");
        vec!["HEAD".to_string()]
    };

    let mut args = vec!["log", "--topo-order", "--format=%H %s"];
    args.extend(range.iter().map(String::as_str));
    let output = executor.run(&args).await?;
    let commits = parse_log(&output.stdout);

    info!(%remote, %branch, count = commits.len(), "resolved unpushed commits");
    Ok(commits)
}

async fn ref_exists<E: CommandExecutor>(executor: &E, reference: &str) -> Result<bool, ReconcileError> {
    match executor
        .run(&["rev-parse", "--verify", "--quiet", reference])
        .await
    {
        Ok(output) => Ok(!output.stdout.trim().is_empty()),
        Err(ExecError::CommandFailed { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn has_tracking_refs<E: CommandExecutor>(executor: &E, remote: &str) -> Result<bool, ReconcileError> {
    let output = executor
        .run(&[
            "for-each-ref",
            "--count=1",
            "--format=%(refname)",
            &format!("refs/remotes/{remote}/"),
        ])
        .await?;
    Ok(!output.stdout.trim().is_empty())
}

/// Split one `%H %s` line on its first whitespace: hash, then subject.
pub fn parse_commit_line(line: &str) -> Commit {
    match line.trim().split_once(char::is_whitespace) {
        Some((hash, message)) => Commit::new(hash, message.trim_start()),
        None => Commit::new(line.trim(), ""),
    }
}

/// Parse `%H %s` lines (newest first) into commits, oldest first.
fn parse_log(stdout: &str) -> DivergenceSet {
    let mut commits: DivergenceSet = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_commit_line)
        .collect();

    // git log is newest first; remote refs can only advance oldest to newest.
    commits.reverse();
    commits
}
