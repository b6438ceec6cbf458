//! Event context of one run, built from the GitHub Actions environment and
//! the event payload file.

use std::path::Path;

use pr_tracker::RepoRef;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{ReviewError, ReviewResult};

/// Event that the pipeline handles.
pub const PULL_REQUEST_EVENT: &str = "pull_request";
/// API base used when `GITHUB_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Who triggered what, on which repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub event_name: String,
    pub repo: RepoRef,
    pub actor: String,
    pub pr_number: Option<u64>,
    /// Issue number of the event (for pull requests the same as `pr_number`).
    pub issue_number: Option<u64>,
    pub api_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    pull_request: Option<NumberOnly>,
    #[serde(default)]
    issue: Option<NumberOnly>,
}

#[derive(Debug, Deserialize)]
struct NumberOnly {
    number: Option<u64>,
}

impl EventContext {
    pub fn from_env() -> ReviewResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the context from `GITHUB_*` variables returned by `lookup`.
    /// The payload at `GITHUB_EVENT_PATH` is optional; a path that is set but
    /// unreadable or not JSON is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReviewResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let event_name = var("GITHUB_EVENT_NAME")
            .ok_or_else(|| ReviewError::Config("GITHUB_EVENT_NAME is not set".into()))?;
        let repo_full = var("GITHUB_REPOSITORY")
            .ok_or_else(|| ReviewError::Config("GITHUB_REPOSITORY is not set".into()))?;
        let repo = RepoRef::parse(&repo_full).map_err(|e| ReviewError::Config(e.to_string()))?;
        let actor = var("GITHUB_ACTOR").unwrap_or_default();
        let api_url = var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let payload = match var("GITHUB_EVENT_PATH") {
            Some(path) => read_payload(Path::new(&path))?,
            None => Payload::default(),
        };

        let pr_number = payload.pull_request.as_ref().and_then(|p| p.number);
        let issue_number = payload
            .issue
            .as_ref()
            .and_then(|i| i.number)
            .or(pr_number)
            .or(payload.number);

        debug!(event = %event_name, repo = %repo, ?pr_number, ?issue_number, "event context loaded");
        Ok(Self {
            event_name,
            repo,
            actor,
            pr_number,
            issue_number,
            api_url,
        })
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_name == PULL_REQUEST_EVENT
    }
}

fn read_payload(path: &Path) -> ReviewResult<Payload> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
