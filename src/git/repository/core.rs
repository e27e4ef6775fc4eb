use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use git2::Repository;

pub struct GitRepo {
    path: PathBuf,
    repo: Repository,
}

impl GitRepo {
    /// Find the repository containing `path`, searching parent directories
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let repo = Repository::discover(path.as_ref()).context(format!(
            "Not inside a git repository: {}",
            path.as_ref().display()
        ))?;

        // Commands run from the top of the working tree, or the git dir when bare
        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        Ok(Self { path, repo })
    }

    /// Working tree root (the git directory for bare repositories)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all configured remotes
    pub fn remote_names(&self) -> Result<Vec<String>, Error> {
        let remotes = self.repo.remotes().context("Failed to get remotes list")?;

        Ok(remotes.iter().flatten().map(str::to_string).collect())
    }

    /// Fail with a helpful message if `name` is not a configured remote
    pub fn ensure_remote(&self, name: &str) -> Result<(), Error> {
        let names = self.remote_names()?;
        if names.iter().any(|n| n == name) {
            return Ok(());
        }

        if names.is_empty() {
            Err(anyhow::anyhow!(
                "Remote '{name}' not found: this repository has no remotes"
            ))
        } else {
            Err(anyhow::anyhow!(
                "Remote '{name}' not found (available: {})",
                names.join(", ")
            ))
        }
    }
}

#[cfg(test)]
impl GitRepo {
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path_ref = path.as_ref();

        // Check if it's already a git repository
        if Repository::open(path_ref).is_ok() {
            return Err(anyhow::anyhow!("Directory is already a git repository"));
        }

        let repo = Repository::init(path_ref).context("Failed to initialize git repository")?;

        // Set HEAD to point to master; the branch is born with the first commit
        repo.set_head("refs/heads/master")
            .context("Failed to set HEAD to master")?;

        Ok(Self {
            path: path_ref.to_path_buf(),
            repo,
        })
    }

    pub fn init_bare<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path_ref = path.as_ref();

        if Repository::open(path_ref).is_ok() {
            return Err(anyhow::anyhow!("Directory is already a git repository"));
        }

        let repo =
            Repository::init_bare(path_ref).context("Failed to initialize bare git repository")?;

        repo.set_head("refs/heads/master")
            .context("Failed to set HEAD to master")?;

        Ok(Self {
            path: path_ref.to_path_buf(),
            repo,
        })
    }

    /// Get access to the internal git2 Repository
    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }
}
