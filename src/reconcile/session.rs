//! Sequential batch delivery.
//!
//! A [`PushSession`] owns the plan for one push run. Batches go out strictly
//! in order: batch `i + 1` is only attempted once batch `i`'s outcome is known,
//! because every push moves the same remote branch.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{push_batch, require_name, Batch, Commit, FailurePolicy};
use crate::error::ReconcileError;
use crate::git::CommandExecutor;

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, question: &str) -> bool {
        self(question)
    }
}

/// Progress notifications emitted while a session runs.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    Started {
        remote: &'a str,
        branch: &'a str,
        batches: usize,
        commits: usize,
    },
    BatchStarted {
        batch: &'a Batch,
        total: usize,
    },
    BatchSucceeded {
        batch: &'a Batch,
        total: usize,
    },
    BatchFailed {
        batch: &'a Batch,
        total: usize,
        reason: &'a str,
    },
    /// The session ended early; `remaining` batches were not attempted.
    Stopped {
        remaining: usize,
    },
    Completed {
        report: &'a PushReport,
    },
}

/// Receives [`SessionEvent`]s.
pub trait ProgressSink {
    fn report(&mut self, event: SessionEvent<'_>);
}

impl<F: FnMut(SessionEvent<'_>)> ProgressSink for F {
    fn report(&mut self, event: SessionEvent<'_>) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Planned,
    Pushing(usize),
    BatchSucceeded(usize),
    BatchFailed(usize),
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Succeeded,
    Failed { reason: String },
    NotAttempted,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch: Batch,
    #[serde(flatten)]
    pub status: BatchStatus,
    /// A failed batch whose commits reached the remote anyway because a later
    /// batch's tip was pushed successfully.
    pub carried_by_later_batch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NothingToDeliver,
    Delivered,
    PartiallyDelivered,
    NotDelivered,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToDeliver => write!(f, "nothing to deliver"),
            Self::Delivered => write!(f, "all commits delivered"),
            Self::PartiallyDelivered => write!(f, "partially delivered"),
            Self::NotDelivered => write!(f, "nothing delivered"),
        }
    }
}

/// Terminal record of a push session.
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub remote: String,
    pub branch: String,
    pub policy: FailurePolicy,
    pub total_commits: usize,
    /// Sum of the sizes of the batches whose push was confirmed.
    pub delivered_commits: usize,
    pub batches: Vec<BatchOutcome>,
    pub outcome: Outcome,
}

impl PushReport {
    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches
            .iter()
            .filter(|b| matches!(b.status, BatchStatus::Failed { .. }))
    }

    pub fn unattempted_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::NotAttempted)
    }

    /// Commits of failed and unattempted batches, in plan order.
    pub fn undelivered_commits(&self) -> Vec<&Commit> {
        self.batches
            .iter()
            .filter(|b| b.status != BatchStatus::Succeeded)
            .flat_map(|b| b.batch.commits())
            .collect()
    }

    /// Commits of failed batches that a later successful batch delivered.
    pub fn carried_commits(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.carried_by_later_batch)
            .map(|b| b.batch.len())
            .sum()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::NothingToDeliver | Outcome::Delivered)
    }
}

impl fmt::Display for PushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} commits confirmed on {}/{}",
            self.outcome, self.delivered_commits, self.total_commits, self.remote, self.branch
        )?;
        let failed = self.failed_batches().count();
        let unattempted = self.unattempted_batches().count();
        if failed > 0 || unattempted > 0 {
            write!(f, " ({failed} batch(es) failed, {unattempted} not attempted)")?;
        }
        Ok(())
    }
}

/// One push run: remote, branch, the planned batches and their progress.
#[derive(Debug)]
pub struct PushSession {
    remote: String,
    branch: String,
    policy: FailurePolicy,
    batches: Vec<Batch>,
    statuses: Vec<BatchStatus>,
    cursor: usize,
    delivered: usize,
    failed: usize,
    state: SessionState,
}

impl PushSession {
    pub fn new(
        remote: impl Into<String>,
        branch: impl Into<String>,
        batches: Vec<Batch>,
        policy: FailurePolicy,
    ) -> Result<Self, ReconcileError> {
        let remote = remote.into();
        let branch = branch.into();
        require_name("remote", &remote)?;
        require_name("branch", &branch)?;

        Ok(Self {
            statuses: vec![BatchStatus::NotAttempted; batches.len()],
            remote,
            branch,
            policy,
            batches,
            cursor: 0,
            delivered: 0,
            failed: 0,
            state: SessionState::Planned,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index of the next batch to attempt.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn delivered_commits(&self) -> usize {
        self.delivered
    }

    pub fn failed_commits(&self) -> usize {
        self.failed
    }

    /// Push every batch in order, applying the failure policy, and return
    /// the final report. Running a completed session again only rebuilds
    /// its report.
    #[instrument(skip_all, fields(remote = %self.remote, branch = %self.branch, batches = self.batches.len()))]
    pub async fn run<E, C, S>(&mut self, executor: &E, confirm: &mut C, sink: &mut S) -> PushReport
    where
        E: CommandExecutor,
        C: Confirm,
        S: ProgressSink,
    {
        if self.state != SessionState::Planned {
            return self.report();
        }

        let total = self.batches.len();
        sink.report(SessionEvent::Started {
            remote: &self.remote,
            branch: &self.branch,
            batches: total,
            commits: self.batches.iter().map(Batch::len).sum(),
        });

        while self.cursor < total {
            let index = self.cursor;
            let batch = &self.batches[index];
            self.state = SessionState::Pushing(index);
            sink.report(SessionEvent::BatchStarted { batch, total });

            let result = push_batch(executor, batch, &self.remote, &self.branch).await;
            self.cursor = index + 1;

            match result {
                Ok(()) => {
                    info!(batch = index, tip = %batch.tip().hash, "batch delivered");
                    self.statuses[index] = BatchStatus::Succeeded;
                    self.delivered += batch.len();
                    self.state = SessionState::BatchSucceeded(index);
                    sink.report(SessionEvent::BatchSucceeded { batch, total });
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(batch = index, %reason, "batch failed");
                    self.failed += batch.len();
                    self.state = SessionState::BatchFailed(index);
                    sink.report(SessionEvent::BatchFailed {
                        batch,
                        total,
                        reason: &reason,
                    });
                    self.statuses[index] = BatchStatus::Failed { reason };

                    if !self.continue_after_failure(confirm) {
                        break;
                    }
                }
            }
        }

        let remaining = total - self.cursor;
        if remaining > 0 {
            info!(remaining, "session stopped before the last batch");
            sink.report(SessionEvent::Stopped { remaining });
        }

        self.state = SessionState::Completed;
        let report = self.report();
        sink.report(SessionEvent::Completed { report: &report });
        report
    }

    fn continue_after_failure<C: Confirm>(&self, confirm: &mut C) -> bool {
        if self.cursor >= self.batches.len() {
            return false;
        }
        match self.policy {
            FailurePolicy::StopOnFailure => false,
            FailurePolicy::ContinueWithConfirmation => confirm.confirm(&format!(
                "Batch {}/{} failed. Continue with the next batch?",
                self.cursor,
                self.batches.len()
            )),
        }
    }

    fn report(&self) -> PushReport {
        let last_success = self
            .statuses
            .iter()
            .rposition(|status| *status == BatchStatus::Succeeded);

        let batches: Vec<BatchOutcome> = self
            .batches
            .iter()
            .zip(&self.statuses)
            .map(|(batch, status)| BatchOutcome {
                carried_by_later_batch: matches!(status, BatchStatus::Failed { .. })
                    && last_success.is_some_and(|last| batch.index() < last),
                batch: batch.clone(),
                status: status.clone(),
            })
            .collect();

        let succeeded = self
            .statuses
            .iter()
            .filter(|status| **status == BatchStatus::Succeeded)
            .count();
        let outcome = if batches.is_empty() {
            Outcome::NothingToDeliver
        } else if succeeded == batches.len() {
            Outcome::Delivered
        } else if succeeded > 0 {
            Outcome::PartiallyDelivered
        } else {
            Outcome::NotDelivered
        };

        PushReport {
            remote: self.remote.clone(),
            branch: self.branch.clone(),
            policy: self.policy,
            total_commits: self.batches.iter().map(Batch::len).sum(),
            delivered_commits: self.delivered,
            batches,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::git::GitCli;
    use crate::reconcile::{plan, resolve, BatchSize};
    use crate::test_utils::{
        create_test_bare_repo, create_test_repo, Reply, RepoTestOperations, ScriptedExecutor,
    };

    fn seven_commit_plan() -> Vec<Batch> {
        let commits: Vec<Commit> = (1..=7)
            .map(|i| Commit::new(format!("c{i}"), format!("Commit {i}")))
            .collect();
        plan(&commits, BatchSize::new(3).unwrap())
    }

    fn never_asked(question: &str) -> bool {
        panic!("unexpected confirmation prompt: {question}")
    }

    fn ignore(_: SessionEvent<'_>) {}

    fn push_targets(executor: &ScriptedExecutor) -> Vec<String> {
        executor
            .calls_starting_with("push")
            .into_iter()
            .map(|args| args[2].clone())
            .collect()
    }

    #[tokio::test]
    async fn delivers_every_batch_in_order() {
        let executor = ScriptedExecutor::new();
        let mut session =
            PushSession::new("origin", "main", seven_commit_plan(), FailurePolicy::StopOnFailure)
                .unwrap();
        assert_eq!(session.state(), SessionState::Planned);

        let report = session
            .run(&executor, &mut never_asked, &mut ignore)
            .await;

        assert_eq!(
            push_targets(&executor),
            vec!["c3:refs/heads/main", "c6:refs/heads/main", "c7:refs/heads/main"]
        );
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.cursor(), 3);
        assert_eq!(report.outcome, Outcome::Delivered);
        assert_eq!(report.total_commits, 7);
        assert_eq!(report.delivered_commits, 7);
        assert!(report.undelivered_commits().is_empty());
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn next_push_waits_for_previous_outcome() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let executor = ScriptedExecutor::new()
            .on(&["push", "origin", "c3:refs/heads/main"], Reply::fail(1, "timeout"))
            .with_journal(Rc::clone(&journal));

        let sink_journal = Rc::clone(&journal);
        let mut sink = move |event: SessionEvent<'_>| match event {
            SessionEvent::BatchSucceeded { batch, .. } => sink_journal
                .borrow_mut()
                .push(format!("batch {} succeeded", batch.index())),
            SessionEvent::BatchFailed { batch, .. } => sink_journal
                .borrow_mut()
                .push(format!("batch {} failed", batch.index())),
            _ => {}
        };

        let mut session = PushSession::new(
            "origin",
            "main",
            seven_commit_plan(),
            FailurePolicy::ContinueWithConfirmation,
        )
        .unwrap();
        session
            .run(&executor, &mut |_: &str| true, &mut sink)
            .await;

        assert_eq!(
            *journal.borrow(),
            vec![
                "git push origin c3:refs/heads/main",
                "batch 0 failed",
                "git push origin c6:refs/heads/main",
                "batch 1 succeeded",
                "git push origin c7:refs/heads/main",
                "batch 2 succeeded",
            ]
        );
    }

    #[tokio::test]
    async fn stop_on_failure_leaves_later_batches_unattempted() {
        let executor = ScriptedExecutor::new().on(
            &["push", "origin", "c3:refs/heads/main"],
            Reply::fail(1, "fatal: the remote end hung up unexpectedly"),
        );
        let mut stopped = None;
        let mut sink = |event: SessionEvent<'_>| {
            if let SessionEvent::Stopped { remaining } = event {
                stopped = Some(remaining);
            }
        };

        let mut session =
            PushSession::new("origin", "main", seven_commit_plan(), FailurePolicy::StopOnFailure)
                .unwrap();
        let report = session.run(&executor, &mut never_asked, &mut sink).await;

        assert_eq!(push_targets(&executor), vec!["c3:refs/heads/main"]);
        assert_eq!(stopped, Some(2));
        assert_eq!(report.outcome, Outcome::NotDelivered);
        assert_eq!(report.delivered_commits, 0);
        assert_eq!(session.failed_commits(), 3);
        assert_eq!(report.failed_batches().count(), 1);
        assert_eq!(report.unattempted_batches().count(), 2);

        let undelivered: Vec<_> = report
            .undelivered_commits()
            .iter()
            .map(|c| c.hash.as_str())
            .collect();
        assert_eq!(undelivered, vec!["c1", "c2", "c3", "c4", "c5", "c6", "c7"]);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn confirmed_continuation_marks_carried_batches() {
        let executor = ScriptedExecutor::new().on(
            &["push", "origin", "c3:refs/heads/main"],
            Reply::fail(1, "error: RPC failed"),
        );
        let mut questions = Vec::new();
        let mut confirm = |question: &str| {
            questions.push(question.to_string());
            true
        };

        let mut session = PushSession::new(
            "origin",
            "main",
            seven_commit_plan(),
            FailurePolicy::ContinueWithConfirmation,
        )
        .unwrap();
        let report = session.run(&executor, &mut confirm, &mut ignore).await;

        assert_eq!(questions.len(), 1);
        assert_eq!(push_targets(&executor).len(), 3);
        assert_eq!(report.outcome, Outcome::PartiallyDelivered);
        assert_eq!(report.delivered_commits, 4);
        assert_eq!(report.carried_commits(), 3);
        assert!(report.batches[0].carried_by_later_batch);
        assert!(!report.batches[1].carried_by_later_batch);
    }

    #[tokio::test]
    async fn declined_continuation_stops_the_session() {
        let executor = ScriptedExecutor::new().on(
            &["push", "origin", "c3:refs/heads/main"],
            Reply::fail(1, "error: RPC failed"),
        );

        let mut session = PushSession::new(
            "origin",
            "main",
            seven_commit_plan(),
            FailurePolicy::ContinueWithConfirmation,
        )
        .unwrap();
        let report = session
            .run(&executor, &mut |_: &str| false, &mut ignore)
            .await;

        assert_eq!(push_targets(&executor).len(), 1);
        assert_eq!(report.unattempted_batches().count(), 2);
        assert_eq!(report.carried_commits(), 0);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn failure_of_last_batch_does_not_prompt() {
        let executor = ScriptedExecutor::new().on(
            &["push", "origin", "c7:refs/heads/main"],
            Reply::fail(1, "error: RPC failed"),
        );

        let mut session = PushSession::new(
            "origin",
            "main",
            seven_commit_plan(),
            FailurePolicy::ContinueWithConfirmation,
        )
        .unwrap();
        let report = session.run(&executor, &mut never_asked, &mut ignore).await;

        assert_eq!(report.delivered_commits, 6);
        assert_eq!(report.outcome, Outcome::PartiallyDelivered);
        assert_eq!(report.unattempted_batches().count(), 0);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn empty_plan_is_nothing_to_deliver() {
        let executor = ScriptedExecutor::new();

        let mut session =
            PushSession::new("origin", "main", Vec::new(), FailurePolicy::StopOnFailure).unwrap();
        let report = session.run(&executor, &mut never_asked, &mut ignore).await;

        assert_eq!(report.outcome, Outcome::NothingToDeliver);
        assert!(report.is_success());
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn completed_session_does_not_push_again() {
        let executor = ScriptedExecutor::new();
        let mut session =
            PushSession::new("origin", "main", seven_commit_plan(), FailurePolicy::StopOnFailure)
                .unwrap();

        session.run(&executor, &mut never_asked, &mut ignore).await;
        let again = session.run(&executor, &mut never_asked, &mut ignore).await;

        assert_eq!(push_targets(&executor).len(), 3);
        assert_eq!(again.delivered_commits, 7);
    }

    #[test]
    fn new_rejects_blank_branch() {
        let err = PushSession::new("origin", " ", Vec::new(), FailurePolicy::StopOnFailure)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { field: "branch", .. }));
    }

    #[test]
    fn report_serializes_batch_status_inline() {
        let mut session =
            PushSession::new("origin", "main", seven_commit_plan(), FailurePolicy::StopOnFailure)
                .unwrap();
        session.statuses[0] = BatchStatus::Failed {
            reason: "boom".to_string(),
        };

        let json = serde_json::to_value(session.report()).unwrap();

        assert_eq!(json["policy"], "stop");
        assert_eq!(json["batches"][0]["status"], "failed");
        assert_eq!(json["batches"][0]["reason"], "boom");
        assert_eq!(json["batches"][1]["status"], "not_attempted");
        assert_eq!(json["batches"][0]["batch"]["commits"][2]["hash"], "c3");
    }

    #[tokio::test]
    async fn delivers_to_real_remote_in_batches() {
        let (_remote_dir, remote_repo) = create_test_bare_repo();
        let (_local_dir, local_repo) = create_test_repo();
        for i in 1..=7 {
            local_repo
                .add_file_and_commit(&format!("file{i}.txt"), "content", &format!("Commit {i}"))
                .unwrap();
        }
        local_repo.add_local_remote("origin", &remote_repo).unwrap();

        let git = GitCli::new(local_repo.path());
        let commits = resolve(&git, "origin", None).await.unwrap();
        assert_eq!(commits.len(), 7);

        let mut pushed_tips = Vec::new();
        let mut sink = |event: SessionEvent<'_>| {
            if let SessionEvent::BatchSucceeded { batch, .. } = event {
                pushed_tips.push(batch.tip().message.clone());
            }
        };
        let mut session = PushSession::new(
            "origin",
            "master",
            plan(&commits, BatchSize::new(3).unwrap()),
            FailurePolicy::StopOnFailure,
        )
        .unwrap();
        let report = session.run(&git, &mut never_asked, &mut sink).await;

        assert_eq!(report.outcome, Outcome::Delivered);
        assert_eq!(report.delivered_commits, 7);
        assert_eq!(pushed_tips, vec!["Commit 3", "Commit 6", "Commit 7"]);
        assert_eq!(
            remote_repo.branch_target("master").unwrap(),
            local_repo.head_hash().unwrap()
        );

        let remaining = resolve(&git, "origin", None).await.unwrap();
        assert!(remaining.is_empty());
    }
}
