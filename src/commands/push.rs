use batchpush::config::Settings;
use batchpush::reconcile::{
    current_branch, plan, resolve, BatchSize, FailurePolicy, PushSession, SessionEvent,
};
use console::style;
use inquire::{Confirm, Select, Text};

use super::open_target;
use crate::tui::push_display::{display_pending, display_report, ConsoleProgress};

const CUSTOM_SIZE: &str = "Custom";
const PRESET_SIZES: [&str; 3] = ["1", "3", "5"];

/// Options of one `push` invocation, before config defaults are applied
pub struct PushOptions {
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub batch_size: Option<usize>,
    pub on_failure: Option<FailurePolicy>,
    pub yes: bool,
    pub json: bool,
}

/// Deliver every unpushed commit to the remote branch in ordered batches
pub async fn push_in_batches(
    settings: &Settings,
    options: PushOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = open_target(settings, options.remote)?;
    let branch = match options.branch {
        Some(branch) => branch,
        None => current_branch(&target.git).await?,
    };
    let policy = options.on_failure.unwrap_or(settings.push.on_failure);
    let interactive = !options.yes && !options.json;

    if !options.json {
        println!(
            "{} Fetching {} and looking for unpushed commits...",
            style("🔍").blue().bold(),
            style(&target.remote).cyan()
        );
        println!();
    }
    let commits = resolve(&target.git, &target.remote, Some(&branch)).await?;

    if !options.json {
        display_pending(&commits, &target.remote, &branch);
    }

    let batches = if commits.is_empty() {
        Vec::new()
    } else {
        let size = match options.batch_size.or(settings.push.batch_size) {
            Some(size) => BatchSize::new(size)?,
            None if interactive => prompt_batch_size()?,
            None => BatchSize::new(1)?,
        };
        let batches = plan(&commits, size);

        if interactive {
            let question = format!(
                "Push {} commits to {}/{} in {} batches of up to {}?",
                commits.len(),
                target.remote,
                branch,
                batches.len(),
                size
            );
            if !Confirm::new(&question).with_default(true).prompt()? {
                println!("{} Push cancelled", style("⚠").yellow().bold());
                return Ok(());
            }
            println!();
        }
        batches
    };

    let mut session = PushSession::new(&target.remote, &branch, batches, policy)?;
    let mut confirm = |question: &str| continue_after_failure(options.yes, question, ask_user);

    let report = if options.json {
        let mut quiet = |_: SessionEvent<'_>| {};
        session.run(&target.git, &mut confirm, &mut quiet).await
    } else {
        session.run(&target.git, &mut confirm, &mut ConsoleProgress).await
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report);
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// `-y` answers the continuation prompt with yes; otherwise the user decides
fn continue_after_failure(assume_yes: bool, question: &str, ask: impl FnOnce(&str) -> bool) -> bool {
    assume_yes || ask(question)
}

fn ask_user(question: &str) -> bool {
    Confirm::new(question)
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

/// Ask for a batch size from the presets, or a custom positive number
fn prompt_batch_size() -> Result<BatchSize, Box<dyn std::error::Error>> {
    let mut choices: Vec<&str> = PRESET_SIZES.to_vec();
    choices.push(CUSTOM_SIZE);

    let choice = Select::new("Commits per batch:", choices).prompt()?;
    if choice != CUSTOM_SIZE {
        return Ok(choice.parse()?);
    }

    loop {
        let input = Text::new("Batch size:").prompt()?;
        match input.parse::<BatchSize>() {
            Ok(size) => return Ok(size),
            Err(e) => eprintln!("{} {}", style("✗").red().bold(), style(e).red()),
        }
    }
}
