//! Pipeline driver.
//!
//! ValidateEvent → ResolvePrNumber → AssignAuthor → RequestReviewers →
//! FetchPullRequest → GateSize → SynthesizeDescription → ReconcileComments →
//! Done.
//!
//! Validation problems and the size policy stop the run before any write.
//! Failed assignee/reviewer calls are reported and the run continues.
//! A failed PR or file fetch stops the run. Generation errors are returned
//! to the caller.

use std::time::Instant;

use pr_tracker::{IssueClient, PullRequestClient, RepoRef};
use tracing::{debug, info, warn};

use crate::{
    context::{EventContext, PULL_REQUEST_EVENT},
    describe::{DescriptionOutcome, ensure_description},
    errors::{ReviewError, ReviewResult},
    gate::{check_size_limit, fetch_changed_files},
    generator::TextGenerator,
    inputs::ReviewSettings,
    prompt::PromptBuilder,
    reconcile::{ApplyStats, Reconciler},
    report::Reporter,
    snapshot::PullRequestSnapshot,
};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ValidateEvent,
    ResolvePrNumber,
    AssignAuthor,
    RequestReviewers,
    FetchPullRequest,
    GateSize,
    SynthesizeDescription,
    ReconcileComments,
    Done,
}

/// Where the run stopped and what it did.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `Done` on a full run, otherwise the stage that stopped it.
    pub stopped_at: Stage,
    /// Failures reported during the run.
    pub failures: Vec<String>,
    pub description: Option<DescriptionOutcome>,
    pub comments: Option<ApplyStats>,
}

/// External collaborators of one run.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub issues: &'a dyn IssueClient,
    pub pulls: &'a dyn PullRequestClient,
    pub generator: &'a dyn TextGenerator,
    pub prompts: &'a dyn PromptBuilder,
}

/// Runs the whole pipeline for `ctx`.
pub async fn run_pipeline(
    ctx: &EventContext,
    settings: &ReviewSettings,
    deps: Collaborators<'_>,
    reporter: &Reporter,
) -> ReviewResult<RunOutcome> {
    let t0 = Instant::now();
    let stop = |stage: Stage| RunOutcome {
        stopped_at: stage,
        failures: reporter.failures(),
        description: None,
        comments: None,
    };

    // ValidateEvent, ResolvePrNumber
    let pr = match validate_event(ctx, reporter) {
        Ok(pr) => pr,
        Err(stage) => return Ok(stop(stage)),
    };
    info!(pr, repo = %ctx.repo, "review run start");

    // AssignAuthor
    assign_author(deps.issues, &ctx.repo, ctx.issue_number.unwrap_or(pr), &ctx.actor, reporter).await;

    // RequestReviewers
    request_reviewers(deps.pulls, &ctx.repo, pr, &settings.reviewers, reporter).await;

    // FetchPullRequest
    let mut snapshot = match fetch_snapshot(deps.pulls, &ctx.repo, pr).await {
        Ok(s) => s,
        Err(e) => {
            warn!(pr, error = %e, "pull request fetch failed");
            reporter.fail(format!("failed to fetch PR #{pr}: {e}"));
            return Ok(stop(Stage::FetchPullRequest));
        }
    };

    // GateSize
    if !check_size_limit(&snapshot.changed_files, settings.max_changed_lines, reporter) {
        return Ok(stop(Stage::GateSize));
    }

    // SynthesizeDescription
    let description = ensure_description(
        deps.pulls,
        deps.generator,
        deps.prompts,
        &ctx.repo,
        &mut snapshot,
        reporter,
    )
    .await?;

    // ReconcileComments
    let existing = match deps.issues.list_comments(&ctx.repo, pr).await {
        Ok(c) => c,
        Err(e) => {
            warn!(pr, error = %e, "listing comments failed, skipping review comments");
            reporter.fail(format!("failed to list comments of PR #{pr}: {e}"));
            return Ok(RunOutcome {
                description: Some(description),
                ..stop(Stage::ReconcileComments)
            });
        }
    };
    debug!(pr, count = existing.len(), "existing comments listed");

    let stats = Reconciler {
        issues: deps.issues,
        generator: deps.generator,
        prompts: deps.prompts,
        settings,
        reporter,
        repo: &ctx.repo,
        pr,
    }
    .reconcile(&existing, &snapshot.changed_files)
    .await?;

    info!(
        pr,
        failures = reporter.failures().len(),
        latency_ms = t0.elapsed().as_millis() as u64,
        "review run done"
    );
    Ok(RunOutcome {
        stopped_at: Stage::Done,
        failures: reporter.failures(),
        description: Some(description),
        comments: Some(stats),
    })
}

/// Checks that `ctx` is a pull-request event with a PR number.
///
/// Returns the PR number, or reports the problem and returns the stage that
/// rejected the event. Needs no inputs and makes no calls.
pub fn validate_event(ctx: &EventContext, reporter: &Reporter) -> Result<u64, Stage> {
    if !ctx.is_pull_request() {
        reporter.fail(
            ReviewError::Validation(format!(
                "event '{}' is not supported, expected '{PULL_REQUEST_EVENT}'",
                ctx.event_name
            ))
            .to_string(),
        );
        return Err(Stage::ValidateEvent);
    }
    ctx.pr_number.ok_or_else(|| {
        reporter.fail(ReviewError::Validation("the event payload has no pull request number".into()).to_string());
        Stage::ResolvePrNumber
    })
}

/// Assigns `actor` when the issue has no assignees. A failed listing is
/// reported and treated as "no assignees".
async fn assign_author(issues: &dyn IssueClient, repo: &RepoRef, issue: u64, actor: &str, reporter: &Reporter) {
    let unassigned = match issues.list_assignees(repo, issue).await {
        Ok(list) => list.is_empty(),
        Err(e) => {
            reporter.fail(format!("failed to list assignees of #{issue}: {e}"));
            true
        }
    };
    if !unassigned {
        debug!(issue, "already assigned");
        return;
    }
    if actor.is_empty() {
        warn!(issue, "no actor to assign");
        return;
    }

    let logins = [actor.to_string()];
    match issues.add_assignees(repo, issue, &logins).await {
        Ok(()) => info!(issue, actor, "author assigned"),
        Err(e) => reporter.fail(format!("failed to assign {actor} to #{issue}: {e}")),
    }
}

async fn request_reviewers(
    pulls: &dyn PullRequestClient,
    repo: &RepoRef,
    pr: u64,
    reviewers: &[String],
    reporter: &Reporter,
) {
    if reviewers.is_empty() {
        debug!(pr, "no reviewers configured");
        return;
    }
    match pulls.request_reviewers(repo, pr, reviewers).await {
        Ok(201) => info!(pr, count = reviewers.len(), "reviewers requested"),
        Ok(status) => reporter.fail(format!(
            "requesting reviewers for PR #{pr} returned status {status}, expected 201"
        )),
        Err(e) => reporter.fail(format!("failed to request reviewers for PR #{pr}: {e}")),
    }
}

async fn fetch_snapshot(pulls: &dyn PullRequestClient, repo: &RepoRef, pr: u64) -> ReviewResult<PullRequestSnapshot> {
    let pull = pulls.get_pull_request(repo, pr).await?;
    let files = fetch_changed_files(pulls, repo, pr).await?;
    Ok(PullRequestSnapshot::new(pull, files))
}

#[cfg(test)]
mod tests {
    use pr_tracker::Assignee;

    use super::*;
    use crate::{
        prompt::DefaultPrompts,
        reconcile::marker::CommentMarker,
        report::TEXT_OUTPUT,
        testing::{FakeTracker, ScriptedGenerator, file, repo},
    };

    fn ctx(event: &str, pr: Option<u64>) -> EventContext {
        EventContext {
            event_name: event.to_string(),
            repo: repo(),
            actor: "octocat".into(),
            pr_number: pr,
            issue_number: pr,
            api_url: "https://api.github.com".into(),
        }
    }

    fn settings() -> ReviewSettings {
        ReviewSettings {
            bot_comment: true,
            reviewers: vec!["alice".into()],
            ..ReviewSettings::default()
        }
    }

    async fn run(
        ctx: &EventContext,
        settings: &ReviewSettings,
        tracker: &FakeTracker,
        generator: &ScriptedGenerator,
        reporter: &Reporter,
    ) -> ReviewResult<RunOutcome> {
        let deps = Collaborators {
            issues: tracker,
            pulls: tracker,
            generator,
            prompts: &DefaultPrompts,
        };
        run_pipeline(ctx, settings, deps, reporter).await
    }

    #[tokio::test]
    async fn non_pull_request_event_makes_no_calls() {
        let tracker = FakeTracker::with_pull(None, vec![file("a.rs", 1, 1, 2)]);
        let generator = ScriptedGenerator::constant("x");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("push", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::ValidateEvent);
        assert!(tracker.calls().is_empty());
        assert_eq!(generator.calls(), 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].contains("push"));
    }

    #[test]
    fn validate_event_needs_pull_request_with_number() {
        let reporter = Reporter::in_memory();
        assert_eq!(validate_event(&ctx("pull_request", Some(7)), &reporter), Ok(7));
        assert!(!reporter.has_failed());

        assert_eq!(validate_event(&ctx("push", Some(7)), &reporter), Err(Stage::ValidateEvent));
        assert_eq!(
            validate_event(&ctx("pull_request", None), &reporter),
            Err(Stage::ResolvePrNumber)
        );
        assert_eq!(reporter.failures().len(), 2);
    }

    #[tokio::test]
    async fn missing_pr_number_stops() {
        let tracker = FakeTracker::with_pull(None, vec![]);
        let generator = ScriptedGenerator::constant("x");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", None), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::ResolvePrNumber);
        assert!(tracker.calls().is_empty());
        assert!(reporter.has_failed());
    }

    #[tokio::test]
    async fn full_run_assigns_requests_describes_and_comments() {
        let tracker = FakeTracker::with_pull(None, vec![file("a.ts", 1, 0, 1), file("b.ts", 2, 0, 2)]);
        let generator = ScriptedGenerator::constant("looks good");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::Done);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.description, Some(DescriptionOutcome::Written("looks good".into())));
        assert_eq!(outcome.comments.map(|s| s.created), Some(2));
        assert_eq!(generator.calls(), 3);

        let s = tracker.state.lock().unwrap();
        assert_eq!(s.added_assignees, vec!["octocat"]);
        assert_eq!(s.requested_reviewers, vec!["alice"]);
        assert_eq!(s.body_updates.len(), 1);
        let marker = CommentMarker::default();
        assert!(s.comments.iter().any(|c| c.body == marker.canonical_body("a.ts", "looks good")));
        drop(s);

        assert_eq!(
            tracker.calls()[..5],
            ["list_assignees", "add_assignees", "request_reviewers", "get_pull_request", "list_files"]
        );
        assert_eq!(reporter.output(TEXT_OUTPUT).as_deref(), Some("looks good"));
    }

    #[tokio::test]
    async fn existing_assignee_and_no_reviewers_skip_those_writes() {
        let tracker = FakeTracker::with_pull(Some("body"), vec![file("a.rs", 1, 0, 1)]);
        tracker.state.lock().unwrap().assignees.push(Assignee { login: "bob".into() });
        let generator = ScriptedGenerator::constant("");
        let reporter = Reporter::in_memory();
        let settings = ReviewSettings {
            reviewers: Vec::new(),
            ..settings()
        };

        let outcome = run(&ctx("pull_request", Some(7)), &settings, &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::Done);
        assert_eq!(tracker.count("add_assignees"), 0);
        assert_eq!(tracker.count("request_reviewers"), 0);
        assert_eq!(outcome.description, Some(DescriptionOutcome::AlreadyPresent));
    }

    #[tokio::test]
    async fn assignee_listing_failure_is_reported_and_author_still_assigned() {
        let tracker = FakeTracker::with_pull(Some("body"), vec![file("a.rs", 1, 0, 1)]);
        tracker.fail_on("list_assignees");
        tracker.fail_on("request_reviewers");
        let generator = ScriptedGenerator::constant("ok");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::Done);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(tracker.state.lock().unwrap().added_assignees, vec!["octocat"]);
    }

    #[tokio::test]
    async fn oversized_pull_request_stops_before_generation() {
        let tracker = FakeTracker::with_pull(None, vec![file("big.rs", 1000, 25, 1024)]);
        let generator = ScriptedGenerator::constant("x");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::GateSize);
        assert_eq!(generator.calls(), 0);
        assert_eq!(tracker.count("list_comments"), 0);
        assert_eq!(tracker.count("update_body"), 0);
    }

    #[tokio::test]
    async fn file_fetch_failure_stops() {
        let tracker = FakeTracker::with_pull(None, vec![file("a.rs", 1, 0, 1)]);
        tracker.fail_on("list_files");
        let generator = ScriptedGenerator::constant("x");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::FetchPullRequest);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn comment_listing_failure_skips_reconciliation() {
        let tracker = FakeTracker::with_pull(Some("body"), vec![file("a.rs", 1, 0, 1)]);
        tracker.fail_on("list_comments");
        let generator = ScriptedGenerator::constant("x");
        let reporter = Reporter::in_memory();

        let outcome = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.stopped_at, Stage::ReconcileComments);
        assert_eq!(outcome.description, Some(DescriptionOutcome::AlreadyPresent));
        assert_eq!(generator.calls(), 0);
        assert_eq!(tracker.count("create_comment"), 0);
        assert!(reporter.has_failed());
    }

    #[tokio::test]
    async fn generation_failure_aborts_the_run() {
        let tracker = FakeTracker::with_pull(None, vec![file("a.rs", 1, 0, 1)]);
        let generator = ScriptedGenerator::failing();
        let reporter = Reporter::in_memory();

        let err = run(&ctx("pull_request", Some(7)), &settings(), &tracker, &generator, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::Generation(_)));
        assert_eq!(tracker.count("list_comments"), 0);
    }
}
