//! Tracker-agnostic data model for pull requests, files and comments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{TrackerError, TrackerResult};

/// Repository coordinates, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Splits "owner/repo" into components or returns a validation error.
    pub fn parse(full_name: &str) -> TrackerResult<Self> {
        let mut parts = full_name.split('/');
        let owner = parts.next().unwrap_or("").trim();
        let name = parts.next().unwrap_or("").trim();

        if owner.is_empty() || name.is_empty() || parts.next().is_some() {
            return Err(TrackerError::Validation(format!(
                "invalid repository '{}', expected 'owner/repo'",
                full_name
            )));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A user currently assigned to an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub login: String,
}

/// Pull request fields the bot reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// `None` when the author left the description empty.
    pub body: Option<String>,
}

/// One file touched by a pull request. Identity is `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

/// Issue comment on a pull request conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// True when the tracker reports the author's type as a bot account.
    pub author_is_bot: bool,
    pub body: String,
}
