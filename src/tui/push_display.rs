use batchpush::reconcile::{
    BatchStatus, Commit, ProgressSink, PushReport, RollbackOutcome, SessionEvent,
};
use console::style;

/// Prints one line per session event as batches go out
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, event: SessionEvent<'_>) {
        match event {
            SessionEvent::Started {
                remote,
                branch,
                batches,
                commits,
            } => {
                if commits == 0 {
                    return;
                }
                println!(
                    "{} Pushing {} commits to {} in {} batches",
                    style("🚀").cyan().bold(),
                    commits,
                    style(format!("{remote}/{branch}")).cyan(),
                    batches
                );
                println!();
            }
            SessionEvent::BatchStarted { batch, total } => {
                println!(
                    "{} Batch {}/{}: {} commits up to {}",
                    style("⏳").blue(),
                    batch.index() + 1,
                    total,
                    batch.len(),
                    style(batch.tip().short_hash()).yellow()
                );
                for commit in batch.commits() {
                    println!(
                        "    {} {}",
                        style(commit.short_hash()).dim(),
                        style(&commit.message).dim()
                    );
                }
            }
            SessionEvent::BatchSucceeded { batch, total } => {
                println!(
                    "  {} Batch {}/{} pushed",
                    style("✓").green().bold(),
                    batch.index() + 1,
                    total
                );
            }
            SessionEvent::BatchFailed {
                batch,
                total,
                reason,
            } => {
                println!(
                    "  {} Batch {}/{} failed: {}",
                    style("✗").red().bold(),
                    batch.index() + 1,
                    total,
                    style(reason).red()
                );
            }
            SessionEvent::Stopped { remaining } => {
                println!(
                    "{} Stopped with {} batches not attempted",
                    style("⚠").yellow().bold(),
                    remaining
                );
            }
            SessionEvent::Completed { .. } => {}
        }
    }
}

/// Numbered list of commits the remote does not have yet, oldest first
pub fn display_pending(commits: &[Commit], remote: &str, branch: &str) {
    if commits.is_empty() {
        println!(
            "{} {} is up to date",
            style("✨").green().bold(),
            style(format!("{remote}/{branch}")).cyan()
        );
        return;
    }

    println!(
        "{} {} commits not on {}:",
        style("📋").cyan().bold(),
        commits.len(),
        style(format!("{remote}/{branch}")).cyan()
    );
    println!();

    for (number, commit) in commits.iter().enumerate() {
        display_commit(number + 1, commit);
    }
    println!();
}

fn display_commit(number: usize, commit: &Commit) {
    println!(
        "  {:>3}. {} {}",
        number,
        style(commit.short_hash()).yellow(),
        commit.message
    );
}

/// Final summary of a push session
pub fn display_report(report: &PushReport) {
    println!();
    let marker = if report.is_success() {
        style("✨").green().bold()
    } else {
        style("⚠").yellow().bold()
    };
    println!("{} {}", marker, report);

    let carried = report.carried_commits();
    if carried > 0 {
        println!(
            "  {} {} commits of failed batches reached the remote with a later batch",
            style("💡").blue(),
            carried
        );
    }

    let undelivered: Vec<_> = report
        .batches
        .iter()
        .filter(|b| b.status != BatchStatus::Succeeded && !b.carried_by_later_batch)
        .collect();
    if undelivered.is_empty() {
        return;
    }

    println!();
    println!("{} Not confirmed on the remote:", style("📋").cyan().bold());
    for outcome in undelivered {
        let label = match &outcome.status {
            BatchStatus::Failed { .. } => style("failed").red(),
            _ => style("not attempted").dim(),
        };
        for commit in outcome.batch.commits() {
            println!(
                "  {} {} {}",
                style(commit.short_hash()).yellow(),
                commit.message,
                label
            );
        }
    }
}

/// Warning shown before a rollback asks for confirmation
pub fn display_undo_warning(remote: &str, branch: &str) {
    println!(
        "{} {}",
        style("⚠").red().bold(),
        style("This rewrites the history of a shared branch").red().bold()
    );
    println!(
        "  {} will be force-moved back one commit. Anyone who already pulled",
        style(format!("{remote}/{branch}")).cyan()
    );
    println!("  the removed commit will have to reconcile by hand.");
    println!();
}

/// Most recent commits, newest first, so the user sees what the rollback removes
pub fn display_recent_commits(commits: &[Commit]) {
    println!("{} Most recent commits:", style("📝").blue().bold());
    for (position, commit) in commits.iter().enumerate() {
        let marker = if position == 0 {
            style("← removed from remote").red()
        } else {
            style("").dim()
        };
        println!(
            "  {} {} {}",
            style(commit.short_hash()).yellow(),
            commit.message,
            marker
        );
    }
    println!();
}

pub fn display_rollback(outcome: &RollbackOutcome) {
    println!("{} {}", style("✓").green().bold(), outcome);
}
