use std::path::PathBuf;

use batchpush::reconcile::FailurePolicy;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bpush", version)]
#[command(about = "Push unpushed commits to a remote in ordered batches")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push unpushed commits batch by batch, oldest first
    Push {
        /// Remote to push to (default from config, else origin)
        #[arg(short, long)]
        remote: Option<String>,
        /// Remote branch to advance (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Commits per batch; prompts when omitted
        #[arg(short = 'n', long)]
        batch_size: Option<usize>,
        /// What to do when a batch fails: stop, or ask whether to continue
        #[arg(long, value_name = "stop|ask")]
        on_failure: Option<FailurePolicy>,
        /// Skip the start confirmation, use defaults for missing options, and
        /// answer yes when `--on-failure ask` offers to continue after a failed batch
        #[arg(short, long)]
        yes: bool,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List commits that have not reached the remote branch yet
    Pending {
        /// Remote to compare against (default from config, else origin)
        #[arg(short, long)]
        remote: Option<String>,
        /// Remote branch to compare against (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Print the commits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move the remote branch back to the commit before HEAD (rewrites remote history)
    Undo {
        /// Remote to roll back (default from config, else origin)
        #[arg(short, long)]
        remote: Option<String>,
        /// Remote branch to roll back (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Skip both confirmations
        #[arg(short, long)]
        yes: bool,
    },
}
