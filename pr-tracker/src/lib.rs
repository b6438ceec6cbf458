//! Issue / pull-request tracker client for the review bot.
//!
//! The bot only depends on the [`IssueClient`] and [`PullRequestClient`]
//! traits; [`GitHubClient`] is the production implementation.

pub mod errors;
pub mod git_providers;

pub use errors::{TrackerError, TrackerProviderError, TrackerResult};
pub use git_providers::{
    Assignee, ChangedFile, Comment, IssueClient, PullRequest, PullRequestClient, RepoRef,
    TrackerConfig, TrackerFuture, github::GitHubClient,
};
