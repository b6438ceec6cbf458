//! Public entry for the pull-request review pipeline.
//!
//! One run per pull-request event:
//!
//! 1) **Validate** the event and resolve the PR number
//! 2) **Triage**: assign the author when nobody is assigned, request reviewers
//! 3) **Fetch** the PR and its changed files, then **gate** on changed lines
//! 4) **Describe**: generate a body when the PR has none
//! 5) **Review**: one AI review comment per changed file, reconciled so that
//!    re-running never duplicates comments
//!
//! [`run_action`] wires the production collaborators ([`GitHubClient`] and
//! [`LlmService`]) and bounds the run with a timeout. [`complete_prompt`] is
//! the standalone single-completion mode.

pub mod context;
pub mod describe;
pub mod errors;
pub mod gate;
pub mod generator;
pub mod inputs;
pub mod orchestrator;
pub mod prompt;
pub mod reconcile;
pub mod report;
pub mod snapshot;
pub mod text;

#[cfg(test)]
mod testing;

use std::time::Duration;

use ai_llm_service::LlmService;
use pr_tracker::GitHubClient;
use tracing::{debug, info};

use context::EventContext;
use errors::{ReviewError, ReviewResult};
use generator::TextGenerator;
use inputs::{Inputs, ReviewSettings};
use orchestrator::{Collaborators, RunOutcome, run_pipeline};
use prompt::DefaultPrompts;
use report::{Reporter, TEXT_OUTPUT};

/// Runs the review pipeline against GitHub with the configured generator.
///
/// Returns `Err` for configuration problems, generation failures and an
/// expired run timeout. Failures that do not abort the run are recorded on
/// `reporter` and listed in the returned [`RunOutcome`].
pub async fn run_action(inputs: &Inputs, ctx: &EventContext, reporter: &Reporter) -> ReviewResult<RunOutcome> {
    let tracker = GitHubClient::from_config(inputs.tracker_config(&ctx.api_url)?)?;
    let llm = build_llm(inputs)?;
    debug!(provider = %llm.provider(), model = %inputs.llm.model, "collaborators ready");

    let deps = Collaborators {
        issues: &tracker,
        pulls: &tracker,
        generator: &llm,
        prompts: &DefaultPrompts,
    };

    let budget = Duration::from_secs(inputs.run_timeout_secs);
    run_with(ctx, &inputs.review, deps, budget, reporter).await
}

/// Runs the pipeline with `deps`, giving up after `budget`.
pub async fn run_with(
    ctx: &EventContext,
    settings: &ReviewSettings,
    deps: Collaborators<'_>,
    budget: Duration,
    reporter: &Reporter,
) -> ReviewResult<RunOutcome> {
    tokio::time::timeout(budget, run_pipeline(ctx, settings, deps, reporter))
        .await
        .map_err(|_| ReviewError::Timeout(budget))?
}

/// Completes the `openai-prompt` input once and records the sanitized text
/// as the `text` output.
pub async fn complete_prompt(inputs: &Inputs, reporter: &Reporter) -> ReviewResult<String> {
    let prompt = inputs
        .prompt
        .as_deref()
        .ok_or_else(|| ReviewError::Config("missing required input 'openai-prompt'".into()))?;
    let llm = build_llm(inputs)?;

    let budget = Duration::from_secs(inputs.run_timeout_secs);
    complete_with(&llm, prompt, budget, reporter).await
}

fn build_llm(inputs: &Inputs) -> ReviewResult<LlmService> {
    LlmService::from_config(inputs.llm.clone()).map_err(|e| ReviewError::Config(e.to_string()))
}

async fn complete_with(
    generator: &dyn TextGenerator,
    prompt: &str,
    budget: Duration,
    reporter: &Reporter,
) -> ReviewResult<String> {
    let raw = tokio::time::timeout(budget, generator.generate(prompt))
        .await
        .map_err(|_| ReviewError::Timeout(budget))??;
    let text = text::sanitize(&raw);
    info!(chars = text.chars().count(), "completion done");
    reporter.set_output(TEXT_OUTPUT, &text);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTracker, ScriptedGenerator, StalledGenerator, file, repo};

    fn pull_request_ctx() -> EventContext {
        EventContext {
            event_name: "pull_request".into(),
            repo: repo(),
            actor: "octocat".into(),
            pr_number: Some(7),
            issue_number: Some(7),
            api_url: "https://api.github.com".into(),
        }
    }

    #[tokio::test]
    async fn completion_is_sanitized_and_exported() {
        let generator = ScriptedGenerator::constant("  Use `?`\n");
        let reporter = Reporter::in_memory();

        let text = complete_with(&generator, "hi", Duration::from_secs(5), &reporter)
            .await
            .unwrap();

        assert_eq!(text, "  Use ?");
        assert_eq!(reporter.output(TEXT_OUTPUT).as_deref(), Some("  Use ?"));
        assert_eq!(generator.prompts(), vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn completion_failure_is_an_error() {
        let reporter = Reporter::in_memory();
        let err = complete_with(&ScriptedGenerator::failing(), "hi", Duration::from_secs(5), &reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Generation(_)));
        assert_eq!(reporter.output(TEXT_OUTPUT), None);
    }

    #[tokio::test]
    async fn completion_past_budget_is_a_timeout() {
        let reporter = Reporter::in_memory();
        let budget = Duration::from_millis(10);

        let err = complete_with(&StalledGenerator, "hi", budget, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::Timeout(d) if d == budget));
        assert_eq!(reporter.output(TEXT_OUTPUT), None);
    }

    #[tokio::test]
    async fn run_past_budget_is_a_timeout() {
        let tracker = FakeTracker::with_pull(None, vec![file("a.rs", 1, 0, 1)]);
        let reporter = Reporter::in_memory();
        let budget = Duration::from_millis(10);
        let deps = Collaborators {
            issues: &tracker,
            pulls: &tracker,
            generator: &StalledGenerator,
            prompts: &DefaultPrompts,
        };

        let err = run_with(&pull_request_ctx(), &ReviewSettings::default(), deps, budget, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::Timeout(d) if d == budget));
        assert_eq!(tracker.count("get_pull_request"), 1);
        assert_eq!(tracker.count("update_body"), 0);
    }

    #[tokio::test]
    async fn run_within_budget_finishes() {
        let tracker = FakeTracker::with_pull(Some("existing"), vec![file("a.rs", 1, 0, 1)]);
        let generator = ScriptedGenerator::constant("fine");
        let reporter = Reporter::in_memory();
        let deps = Collaborators {
            issues: &tracker,
            pulls: &tracker,
            generator: &generator,
            prompts: &DefaultPrompts,
        };

        let outcome = run_with(
            &pull_request_ctx(),
            &ReviewSettings::default(),
            deps,
            Duration::from_secs(5),
            &reporter,
        )
        .await
        .unwrap();

        assert_eq!(outcome.stopped_at, orchestrator::Stage::Done);
    }

    #[test]
    fn generator_setup_failure_is_a_config_error() {
        let mut inputs = Inputs::from_lookup(|key| match key {
            "INPUT_MODEL" => Some("gpt-35".into()),
            "INPUT_AZURE-OPENAI-ENDPOINT" => Some("https://example.openai.azure.com".into()),
            "INPUT_AZURE-OPENAI-API-KEY" => Some("k".into()),
            _ => None,
        })
        .unwrap();
        inputs.llm.endpoint = "not-a-url".into();

        assert!(matches!(build_llm(&inputs), Err(ReviewError::Config(_))));
    }
}
