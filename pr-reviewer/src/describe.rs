//! Description synthesis for pull requests opened without a body.

use pr_tracker::{PullRequestClient, RepoRef};
use tracing::{debug, info, warn};

use crate::{
    errors::{ReviewError, ReviewResult},
    generator::TextGenerator,
    prompt::PromptBuilder,
    report::{Reporter, TEXT_OUTPUT},
    snapshot::PullRequestSnapshot,
    text::sanitize,
};

/// What [`ensure_description`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionOutcome {
    /// The pull request already had a body; nothing was generated.
    AlreadyPresent,
    /// A description was generated and written back.
    Written(String),
    /// A description was generated but the write-back failed (reported).
    WriteFailed(String),
    /// The generation was empty after sanitizing; the body was left alone.
    Empty,
}

/// Generates and writes a description when `pr` has none.
///
/// The generated text is sanitized, recorded as the `text` output and
/// written back as the new body. An empty result is not written. A failed
/// write-back is reported and does not fail the call; a failed generation does.
pub async fn ensure_description(
    pulls: &dyn PullRequestClient,
    generator: &dyn TextGenerator,
    prompts: &dyn PromptBuilder,
    repo: &RepoRef,
    pr: &mut PullRequestSnapshot,
    reporter: &Reporter,
) -> ReviewResult<DescriptionOutcome> {
    if pr.has_description() {
        debug!(pr = pr.number, "description present, skipping synthesis");
        return Ok(DescriptionOutcome::AlreadyPresent);
    }

    let prompt = prompts.description_prompt(repo, pr.number, &pr.changed_files);
    let raw = generator.generate(&prompt).await?;
    let text = sanitize(&raw);
    reporter.set_output(TEXT_OUTPUT, &text);

    if text.is_empty() {
        warn!(pr = pr.number, "generated description is empty, body left unchanged");
        return Ok(DescriptionOutcome::Empty);
    }

    match pulls.update_body(repo, pr.number, &text).await {
        Ok(()) => {
            info!(pr = pr.number, chars = text.chars().count(), "description written");
            pr.body = Some(text.clone());
            Ok(DescriptionOutcome::Written(text))
        }
        Err(e) => {
            warn!(pr = pr.number, error = %e, "description write-back failed");
            reporter.fail(format!(
                "failed to update the description of PR #{}: {}",
                pr.number,
                ReviewError::from(e)
            ));
            Ok(DescriptionOutcome::WriteFailed(text))
        }
    }
}
