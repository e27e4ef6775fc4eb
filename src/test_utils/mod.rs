#[cfg(test)]
pub mod repo_extensions;

#[cfg(test)]
pub mod scripted_executor;

#[cfg(test)]
pub use repo_extensions::{create_test_bare_repo, create_test_repo, RepoTestOperations};

#[cfg(test)]
pub use scripted_executor::{Reply, ScriptedExecutor};
