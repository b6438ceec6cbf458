//! Tracker seams without async-trait.
//!
//! The bot talks to the tracker through two narrow traits:
//!   * [`IssueClient`] for assignees and conversation comments
//!   * [`PullRequestClient`] for reviewers, PR metadata, changed files and body
//!
//! Both return boxed futures so they stay object-safe and can be passed as
//! `&dyn IssueClient` / `&dyn PullRequestClient`. [`github::GitHubClient`]
//! implements both; tests substitute in-memory fakes.

pub mod github;
pub mod types;

pub use types::*;

use std::{future::Future, pin::Pin};

use crate::errors::TrackerResult;

/// Boxed, sendable future returned by tracker operations.
pub type TrackerFuture<'a, T> = Pin<Box<dyn Future<Output = TrackerResult<T>> + Send + 'a>>;

/// Runtime configuration for the tracker client.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Access token (installation token or PAT).
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Issue-level operations (assignees, comments).
pub trait IssueClient: Send + Sync {
    /// Users currently assigned to the issue / pull request.
    fn list_assignees<'a>(&'a self, repo: &'a RepoRef, issue: u64) -> TrackerFuture<'a, Vec<Assignee>>;

    /// Adds `logins` as assignees.
    fn add_assignees<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: u64,
        logins: &'a [String],
    ) -> TrackerFuture<'a, ()>;

    /// All conversation comments, oldest first.
    fn list_comments<'a>(&'a self, repo: &'a RepoRef, issue: u64) -> TrackerFuture<'a, Vec<Comment>>;

    /// Creates a comment and returns it.
    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, Comment>;

    /// Replaces the body of an existing comment.
    fn update_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        comment_id: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, ()>;

    fn delete_comment<'a>(&'a self, repo: &'a RepoRef, comment_id: u64) -> TrackerFuture<'a, ()>;
}

/// Pull-request-level operations.
pub trait PullRequestClient: Send + Sync {
    /// Requests reviews; returns the 2xx status the tracker answered with.
    fn request_reviewers<'a>(
        &'a self,
        repo: &'a RepoRef,
        pr: u64,
        reviewers: &'a [String],
    ) -> TrackerFuture<'a, u16>;

    fn get_pull_request<'a>(&'a self, repo: &'a RepoRef, pr: u64) -> TrackerFuture<'a, PullRequest>;

    /// Every changed file, following pagination.
    fn list_files<'a>(&'a self, repo: &'a RepoRef, pr: u64) -> TrackerFuture<'a, Vec<ChangedFile>>;

    /// Overwrites the pull request description.
    fn update_body<'a>(&'a self, repo: &'a RepoRef, pr: u64, body: &'a str) -> TrackerFuture<'a, ()>;
}
