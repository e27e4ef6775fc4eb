use batchpush::config::Settings;
use batchpush::reconcile::{current_branch, resolve};

use super::open_target;
use crate::tui::push_display::display_pending;

/// List the commits `remote/branch` is missing, oldest first
pub async fn show_pending(
    settings: &Settings,
    remote: Option<String>,
    branch: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = open_target(settings, remote)?;
    let branch = match branch {
        Some(branch) => branch,
        None => current_branch(&target.git).await?,
    };

    let commits = resolve(&target.git, &target.remote, Some(&branch)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
    } else {
        display_pending(&commits, &target.remote, &branch);
    }

    Ok(())
}
