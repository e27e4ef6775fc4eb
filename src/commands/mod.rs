pub mod pending;
pub mod push;
pub mod undo;

use batchpush::config::Settings;
use batchpush::git::{GitCli, GitRepo};

/// Repository-bound git runner plus the remote a command targets
pub struct Target {
    pub git: GitCli,
    pub remote: String,
}

/// Open the repository around the working directory and check `remote` exists
pub fn open_target(
    settings: &Settings,
    remote: Option<String>,
) -> Result<Target, Box<dyn std::error::Error>> {
    let repo = GitRepo::discover(".")?;
    let remote = remote.unwrap_or_else(|| settings.push.remote.clone());
    repo.ensure_remote(&remote)?;

    Ok(Target {
        git: GitCli::from_settings(repo.path(), &settings.git),
        remote,
    })
}
