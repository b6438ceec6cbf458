//! Prompt builders for the description and per-file review steps.
//!
//! Wording is not part of the pipeline contract; the pipeline only relies on
//! the description prompt naming the PR, repository and files, and the review
//! prompt naming the file and PR.

use pr_tracker::{ChangedFile, RepoRef};

/// Builds the prompts sent to the text generator.
pub trait PromptBuilder: Send + Sync {
    fn description_prompt(&self, repo: &RepoRef, pr_number: u64, files: &[ChangedFile]) -> String;

    fn review_prompt(&self, filename: &str, pr_number: u64) -> String;
}

/// Built-in prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl PromptBuilder for DefaultPrompts {
    fn description_prompt(&self, repo: &RepoRef, pr_number: u64, files: &[ChangedFile]) -> String {
        let names = files
            .iter()
            .map(|f| f.filename.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut s = String::new();
        s.push_str(&format!(
            "Write a short description for pull request #{pr_number} in the repository {}.\n",
            repo.name
        ));
        s.push_str(&format!("- Files changed: {names}.\n"));
        s.push_str("- Summarize what the change does and why, at a high level.\n");
        s
    }

    fn review_prompt(&self, filename: &str, pr_number: u64) -> String {
        let mut s = String::new();
        s.push_str(&format!("Review {filename} in PR #{pr_number}.\n"));
        s.push_str("Only report aspects that need attention; skip anything that is fine.\n");
        s.push_str("If nothing needs attention, answer with an empty reply.\n");
        s.push_str("\n# Categories\n");
        s.push_str("1. Code quality: errors, unusual constructs, naming, dead code.\n");
        s.push_str("2. Logic and complexity: unbounded or wasteful loops, needless complexity, duplication.\n");
        s.push_str("3. Performance and scalability: bottlenecks, work that grows badly.\n");
        s.push_str("4. Security and error handling: vulnerabilities, unhandled failures.\n");
        s.push_str("5. Testing and documentation: missing tests, undocumented public interfaces.\n");
        s.push_str("\n# Instructions\n- At most 50 words per finding.\n- Use numbered points.\n");
        s
    }
}
