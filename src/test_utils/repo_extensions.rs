use std::path::Path;

use crate::git::GitRepo;
use anyhow::{Context, Error};

/// Create a new temporary repository for testing (HEAD on master)
#[cfg(test)]
pub fn create_test_repo() -> (assert_fs::TempDir, GitRepo) {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let repo = GitRepo::init(temp_dir.path()).unwrap();
    (temp_dir, repo)
}

/// Create a new temporary bare repository for testing
#[cfg(test)]
pub fn create_test_bare_repo() -> (assert_fs::TempDir, GitRepo) {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let repo = GitRepo::init_bare(temp_dir.path()).unwrap();
    (temp_dir, repo)
}

/// Test-only trait that adds test helper operations to GitRepo
#[cfg(test)]
pub trait RepoTestOperations {
    /// Write a file and commit it on top of HEAD (fluent)
    fn add_file_and_commit(
        &self,
        filename: &str,
        content: &str,
        commit_message: &str,
    ) -> Result<&Self, Error>;

    /// Add a remote pointing to another local GitRepo
    fn add_local_remote(&self, name: &str, other_repo: &GitRepo) -> Result<(), Error>;

    /// Full hash of the commit HEAD points at
    fn head_hash(&self) -> Result<String, Error>;

    /// Full hash of the commit `revision` resolves to (e.g. `HEAD~1`)
    fn commit_hash(&self, revision: &str) -> Result<String, Error>;

    /// Full hash of the commit `refs/heads/<branch>` points at
    fn branch_target(&self, branch: &str) -> Result<String, Error>;
}

#[cfg(test)]
impl RepoTestOperations for GitRepo {
    fn add_file_and_commit(
        &self,
        filename: &str,
        content: &str,
        commit_message: &str,
    ) -> Result<&Self, Error> {
        std::fs::write(self.path().join(filename), content)
            .context(format!("Failed to write file '{filename}'"))?;

        let mut index = self
            .repo()
            .index()
            .context("Failed to get repository index")?;
        index
            .add_path(Path::new(filename))
            .context("Failed to add file to index")?;
        index.write().context("Failed to write index")?;

        let tree_id = index
            .write_tree()
            .context("Failed to write tree from index")?;
        let tree = self
            .repo()
            .find_tree(tree_id)
            .context("Failed to find tree")?;

        let signature = git2::Signature::now("Test User", "test@example.com")
            .context("Failed to create signature")?;

        // Get parent commit (if any)
        let parent_commit = match self.repo().head() {
            Ok(head) => Some(
                head.peel_to_commit()
                    .context("Failed to find parent commit")?,
            ),
            Err(_) => None, // First commit, no parent
        };
        let parents: Vec<_> = parent_commit.iter().collect();

        self.repo()
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                commit_message,
                &tree,
                &parents,
            )
            .context("Failed to create commit")?;

        Ok(self)
    }

    fn add_local_remote(&self, name: &str, other_repo: &GitRepo) -> Result<(), Error> {
        let remote_path = other_repo
            .path()
            .to_str()
            .context("Failed to convert remote repository path to string")?;

        self.repo()
            .remote(name, remote_path)
            .context(format!("Failed to add remote '{name}'"))?;

        Ok(())
    }

    fn head_hash(&self) -> Result<String, Error> {
        self.commit_hash("HEAD")
    }

    fn commit_hash(&self, revision: &str) -> Result<String, Error> {
        let commit = self
            .repo()
            .revparse_single(revision)
            .context(format!("Failed to resolve '{revision}'"))?
            .peel_to_commit()
            .context(format!("'{revision}' is not a commit"))?;

        Ok(commit.id().to_string())
    }

    fn branch_target(&self, branch: &str) -> Result<String, Error> {
        let commit = self
            .repo()
            .find_reference(&format!("refs/heads/{branch}"))
            .context(format!("Failed to find branch '{branch}'"))?
            .peel_to_commit()
            .context("Branch does not point at a commit")?;

        Ok(commit.id().to_string())
    }
}
