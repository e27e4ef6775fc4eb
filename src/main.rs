mod cli;
mod commands;
mod tui;

use batchpush::config::Settings;
use clap::Parser;
use cli::{Cli, Commands};
use commands::push::PushOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &settings.log.level);

    let result = match cli.command {
        Commands::Push {
            remote,
            branch,
            batch_size,
            on_failure,
            yes,
            json,
        } => {
            let options = PushOptions {
                remote,
                branch,
                batch_size,
                on_failure,
                yes,
                json,
            };
            commands::push::push_in_batches(&settings, options).await
        }
        Commands::Pending {
            remote,
            branch,
            json,
        } => commands::pending::show_pending(&settings, remote, branch, json).await,
        Commands::Undo {
            remote,
            branch,
            yes,
        } => commands::undo::undo_last(&settings, remote, branch, yes).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins; otherwise -v/-vv raise the configured level
fn init_tracing(verbose: u8, configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => configured,
            1 => "info",
            _ => "debug",
        };
        EnvFilter::new(format!("batchpush={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
