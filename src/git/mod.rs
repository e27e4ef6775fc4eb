//! Git access
//!
//! - `executor`: run git commands and capture their output (everything that
//!   reads or moves refs goes through here)
//! - `repository`: locate the repository and its remotes with git2

pub mod executor;
pub mod repository;

// Re-export the main types
pub use executor::{CommandExecutor, ExecOutput, GitCli};
pub use repository::core::GitRepo;
