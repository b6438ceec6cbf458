use pr_tracker::{ChangedFile, PullRequest};

/// Pull request state the pipeline works on after the fetch stage.
#[derive(Debug, Clone)]
pub struct PullRequestSnapshot {
    pub number: u64,
    pub body: Option<String>,
    pub changed_files: Vec<ChangedFile>,
}

impl PullRequestSnapshot {
    pub fn new(pull: PullRequest, changed_files: Vec<ChangedFile>) -> Self {
        Self {
            number: pull.number,
            body: pull.body,
            changed_files,
        }
    }

    /// True when the author wrote any body at all, whitespace included.
    pub fn has_description(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.is_empty())
    }
}
