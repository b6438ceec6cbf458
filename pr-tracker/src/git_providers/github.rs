//! GitHub tracker (REST v3).
//!
//! Endpoints used:
//!   * GET    /repos/{owner}/{repo}/issues/{number}                 (assignees)
//!   * POST   /repos/{owner}/{repo}/issues/{number}/assignees
//!   * GET    /repos/{owner}/{repo}/issues/{number}/comments
//!   * POST   /repos/{owner}/{repo}/issues/{number}/comments
//!   * PATCH  /repos/{owner}/{repo}/issues/comments/{id}
//!   * DELETE /repos/{owner}/{repo}/issues/comments/{id}
//!   * POST   /repos/{owner}/{repo}/pulls/{number}/requested_reviewers
//!   * GET    /repos/{owner}/{repo}/pulls/{number}
//!   * GET    /repos/{owner}/{repo}/pulls/{number}/files
//!   * PATCH  /repos/{owner}/{repo}/pulls/{number}

use std::time::Duration;

use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, RETRY_AFTER},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::errors::{TrackerConfigError, TrackerProviderError, TrackerResult};
use crate::git_providers::{IssueClient, PullRequestClient, TrackerConfig, TrackerFuture, types::*};

/// Page size for list endpoints (GitHub maximum).
const PER_PAGE: usize = 100;
/// Upper bound on followed pages; GitHub stops listing PR files at 3000.
const MAX_PAGES: u32 = 30;
const API_VERSION: &str = "2022-11-28";

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
    auth: String,     // "Bearer <token>"
}

impl GitHubClient {
    /// Builds a client with a stable user agent and a per-request timeout.
    pub fn from_config(cfg: TrackerConfig) -> TrackerResult<Self> {
        let token = cfg.token.trim();
        if token.is_empty() {
            return Err(TrackerConfigError::MissingToken.into());
        }

        let base_api = cfg.base_api.trim().trim_end_matches('/').to_string();
        if !(base_api.starts_with("http://") || base_api.starts_with("https://")) {
            return Err(TrackerConfigError::InvalidBaseUrl(cfg.base_api).into());
        }

        debug!(base_api = %base_api, timeout_secs = cfg.timeout_secs, "creating GitHubClient");

        let http = Client::builder()
            .user_agent("pr-review-bot/0.1")
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;

        let auth = if token.starts_with("Bearer ") || token.starts_with("token ") {
            token.to_string()
        } else {
            format!("Bearer {token}")
        };

        Ok(Self { http, base_api, auth })
    }

    fn repo_url(&self, repo: &RepoRef, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.base_api, repo.owner, repo.name, tail)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn execute(&self, rb: RequestBuilder) -> TrackerResult<Response> {
        let resp = rb.send().await?;
        check_status(resp).await
    }

    /// Follows `page=` pagination until a short page comes back.
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> TrackerResult<Vec<T>> {
        let mut out = Vec::new();
        for page in 1..=MAX_PAGES {
            let rb = self
                .request(Method::GET, url)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let items: Vec<T> = self.execute(rb).await?.json().await?;
            let n = items.len();
            out.extend(items);
            debug!(url, page, items = n, "GitHub page fetched");
            if n < PER_PAGE {
                return Ok(out);
            }
        }
        warn!(url, max_pages = MAX_PAGES, "GitHub pagination limit reached; list truncated");
        Ok(out)
    }

    pub async fn list_assignees(&self, repo: &RepoRef, issue: u64) -> TrackerResult<Vec<Assignee>> {
        let url = self.repo_url(repo, &format!("issues/{issue}"));
        debug!("GitHub list_assignees: {}", url);

        let resp: GitHubIssue = self.execute(self.request(Method::GET, &url)).await?.json().await?;
        Ok(resp
            .assignees
            .into_iter()
            .map(|u| Assignee { login: u.login })
            .collect())
    }

    pub async fn add_assignees(&self, repo: &RepoRef, issue: u64, logins: &[String]) -> TrackerResult<()> {
        let url = self.repo_url(repo, &format!("issues/{issue}/assignees"));
        debug!("GitHub add_assignees: {} {:?}", url, logins);

        let rb = self
            .request(Method::POST, &url)
            .json(&AssigneesPayload { assignees: logins });
        self.execute(rb).await?;
        Ok(())
    }

    pub async fn list_comments(&self, repo: &RepoRef, issue: u64) -> TrackerResult<Vec<Comment>> {
        let url = self.repo_url(repo, &format!("issues/{issue}/comments"));
        debug!("GitHub list_comments: {}", url);

        let raw: Vec<GitHubComment> = self.get_paginated(&url).await?;
        Ok(raw.into_iter().map(Comment::from).collect())
    }

    pub async fn create_comment(&self, repo: &RepoRef, issue: u64, body: &str) -> TrackerResult<Comment> {
        let url = self.repo_url(repo, &format!("issues/{issue}/comments"));
        debug!("GitHub create_comment: {} (len={})", url, body.len());

        let created: GitHubComment = self
            .execute(self.request(Method::POST, &url).json(&BodyPayload { body }))
            .await?
            .json()
            .await?;
        Ok(created.into())
    }

    pub async fn update_comment(&self, repo: &RepoRef, comment_id: u64, body: &str) -> TrackerResult<()> {
        let url = self.repo_url(repo, &format!("issues/comments/{comment_id}"));
        debug!("GitHub update_comment: {} (len={})", url, body.len());

        self.execute(self.request(Method::PATCH, &url).json(&BodyPayload { body }))
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, repo: &RepoRef, comment_id: u64) -> TrackerResult<()> {
        let url = self.repo_url(repo, &format!("issues/comments/{comment_id}"));
        debug!("GitHub delete_comment: {}", url);

        self.execute(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    pub async fn request_reviewers(&self, repo: &RepoRef, pr: u64, reviewers: &[String]) -> TrackerResult<u16> {
        let url = self.repo_url(repo, &format!("pulls/{pr}/requested_reviewers"));
        debug!("GitHub request_reviewers: {} {:?}", url, reviewers);

        let resp = self
            .execute(self.request(Method::POST, &url).json(&ReviewersPayload { reviewers }))
            .await?;
        Ok(resp.status().as_u16())
    }

    pub async fn get_pull_request(&self, repo: &RepoRef, pr: u64) -> TrackerResult<PullRequest> {
        let url = self.repo_url(repo, &format!("pulls/{pr}"));
        debug!("GitHub get_pull_request: {}", url);

        let resp: GitHubPr = self.execute(self.request(Method::GET, &url)).await?.json().await?;
        Ok(PullRequest {
            number: resp.number,
            body: resp.body,
        })
    }

    pub async fn list_files(&self, repo: &RepoRef, pr: u64) -> TrackerResult<Vec<ChangedFile>> {
        let url = self.repo_url(repo, &format!("pulls/{pr}/files"));
        debug!("GitHub list_files: {}", url);

        let raw: Vec<GitHubPrFile> = self.get_paginated(&url).await?;
        Ok(raw
            .into_iter()
            .map(|f| ChangedFile {
                filename: f.filename,
                additions: f.additions,
                deletions: f.deletions,
                changes: f.changes,
            })
            .collect())
    }

    pub async fn update_body(&self, repo: &RepoRef, pr: u64, body: &str) -> TrackerResult<()> {
        let url = self.repo_url(repo, &format!("pulls/{pr}"));
        debug!("GitHub update_body: {} (len={})", url, body.len());

        self.execute(self.request(Method::PATCH, &url).json(&BodyPayload { body }))
            .await?;
        Ok(())
    }
}

/// Turns a non-2xx response into a status-specific error.
async fn check_status(resp: Response) -> TrackerResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after_secs = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let url = resp.url().to_string();
    let text = resp.text().await.unwrap_or_default();
    let snippet: String = text.chars().take(200).collect();

    warn!(status = status.as_u16(), %url, %snippet, "GitHub returned non-success status");
    Err(TrackerProviderError::from_status(status.as_u16(), retry_after_secs).into())
}

impl IssueClient for GitHubClient {
    fn list_assignees<'a>(&'a self, repo: &'a RepoRef, issue: u64) -> TrackerFuture<'a, Vec<Assignee>> {
        Box::pin(GitHubClient::list_assignees(self, repo, issue))
    }

    fn add_assignees<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: u64,
        logins: &'a [String],
    ) -> TrackerFuture<'a, ()> {
        Box::pin(GitHubClient::add_assignees(self, repo, issue, logins))
    }

    fn list_comments<'a>(&'a self, repo: &'a RepoRef, issue: u64) -> TrackerFuture<'a, Vec<Comment>> {
        Box::pin(GitHubClient::list_comments(self, repo, issue))
    }

    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, Comment> {
        Box::pin(GitHubClient::create_comment(self, repo, issue, body))
    }

    fn update_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        comment_id: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, ()> {
        Box::pin(GitHubClient::update_comment(self, repo, comment_id, body))
    }

    fn delete_comment<'a>(&'a self, repo: &'a RepoRef, comment_id: u64) -> TrackerFuture<'a, ()> {
        Box::pin(GitHubClient::delete_comment(self, repo, comment_id))
    }
}

impl PullRequestClient for GitHubClient {
    fn request_reviewers<'a>(
        &'a self,
        repo: &'a RepoRef,
        pr: u64,
        reviewers: &'a [String],
    ) -> TrackerFuture<'a, u16> {
        Box::pin(GitHubClient::request_reviewers(self, repo, pr, reviewers))
    }

    fn get_pull_request<'a>(&'a self, repo: &'a RepoRef, pr: u64) -> TrackerFuture<'a, PullRequest> {
        Box::pin(GitHubClient::get_pull_request(self, repo, pr))
    }

    fn list_files<'a>(&'a self, repo: &'a RepoRef, pr: u64) -> TrackerFuture<'a, Vec<ChangedFile>> {
        Box::pin(GitHubClient::list_files(self, repo, pr))
    }

    fn update_body<'a>(&'a self, repo: &'a RepoRef, pr: u64, body: &'a str) -> TrackerFuture<'a, ()> {
        Box::pin(GitHubClient::update_body(self, repo, pr, body))
    }
}

/// Issue response (subset).
#[derive(Debug, Deserialize)]
struct GitHubIssue {
    #[serde(default)]
    assignees: Vec<GitHubUser>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// PR response (subset).
#[derive(Debug, Deserialize)]
struct GitHubPr {
    number: u64,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubPrFile {
    filename: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changes: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubComment {
    id: u64,
    body: Option<String>,
    user: Option<GitHubUser>,
}

impl From<GitHubComment> for Comment {
    fn from(c: GitHubComment) -> Self {
        let author_is_bot = c
            .user
            .as_ref()
            .and_then(|u| u.kind.as_deref())
            .is_some_and(|k| k == "Bot");
        Comment {
            id: c.id,
            author_is_bot,
            body: c.body.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BodyPayload<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AssigneesPayload<'a> {
    assignees: &'a [String],
}

#[derive(Debug, Serialize)]
struct ReviewersPayload<'a> {
    reviewers: &'a [String],
}
