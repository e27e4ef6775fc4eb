use batchpush::config::Settings;
use batchpush::git::CommandExecutor;
use batchpush::reconcile::{current_branch, parse_commit_line, undo_last_push};
use console::style;
use inquire::Text;

use super::open_target;
use crate::tui::push_display::{display_recent_commits, display_rollback, display_undo_warning};

/// Force-move the remote branch back to the commit before local HEAD
pub async fn undo_last(
    settings: &Settings,
    remote: Option<String>,
    branch: Option<String>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = open_target(settings, remote)?;
    let branch = match branch {
        Some(branch) => branch,
        None => current_branch(&target.git).await?,
    };

    if !yes {
        display_undo_warning(&target.remote, &branch);

        let recent = target.git.run(&["log", "-3", "--format=%H %s"]).await?;
        let commits: Vec<_> = recent
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_commit_line)
            .collect();
        display_recent_commits(&commits);

        if !typed_yes("Type 'yes' to continue:")? {
            println!("{} Undo cancelled", style("⚠").yellow().bold());
            return Ok(());
        }
        if !typed_yes("Type 'yes' again to force-update the remote:")? {
            println!("{} Undo cancelled", style("⚠").yellow().bold());
            return Ok(());
        }
        println!();
    }

    let outcome = undo_last_push(&target.git, &target.remote, Some(&branch)).await?;
    display_rollback(&outcome);

    Ok(())
}

/// Only the literal word "yes" counts as consent
fn typed_yes(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let answer = Text::new(prompt).prompt()?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
