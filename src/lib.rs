//! Deliver unpushed git commits to a remote branch in ordered batches, and
//! roll the last push back with a lease-guarded force update.

pub mod config;
pub mod error;
pub mod git;
pub mod reconcile;

mod test_utils;
