//! In-memory tracker and generator fakes shared by the unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::{
    AiLlmError,
    error_handler::{Provider, ProviderError, ProviderErrorKind},
};
use pr_tracker::{
    Assignee, ChangedFile, Comment, IssueClient, PullRequest, PullRequestClient, RepoRef,
    TrackerError, TrackerFuture, TrackerProviderError,
};

use crate::generator::{GenerateFuture, TextGenerator};

pub fn file(name: &str, additions: u64, deletions: u64, changes: u64) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        additions,
        deletions,
        changes,
    }
}

pub fn repo() -> RepoRef {
    RepoRef::parse("octo/widgets").unwrap()
}

#[derive(Debug, Default)]
pub struct TrackerState {
    pub assignees: Vec<Assignee>,
    pub added_assignees: Vec<String>,
    pub requested_reviewers: Vec<String>,
    pub comments: Vec<Comment>,
    pub next_id: u64,
    pub pull: Option<PullRequest>,
    pub files: Vec<ChangedFile>,
    pub body_updates: Vec<String>,
    /// Operation names that should fail with HTTP 500.
    pub failing: Vec<&'static str>,
    /// Every call, in order.
    pub calls: Vec<&'static str>,
}

/// Tracker fake implementing both client traits.
#[derive(Debug, Default)]
pub struct FakeTracker {
    pub state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn with_pull(body: Option<&str>, files: Vec<ChangedFile>) -> Self {
        let tracker = Self::default();
        {
            let mut s = tracker.state.lock().unwrap();
            s.pull = Some(PullRequest {
                number: 7,
                body: body.map(str::to_string),
            });
            s.files = files;
            s.next_id = 1000;
        }
        tracker
    }

    pub fn seed_comment(&self, author_is_bot: bool, body: &str) -> u64 {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        s.comments.push(Comment {
            id,
            author_is_bot,
            body: body.to_string(),
        });
        id
    }

    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().unwrap().failing.push(op);
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    fn enter(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, TrackerState>, TrackerError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(op);
        if s.failing.contains(&op) {
            return Err(TrackerError::Provider(TrackerProviderError::from_status(500, None)));
        }
        Ok(s)
    }
}

impl IssueClient for FakeTracker {
    fn list_assignees<'a>(&'a self, _repo: &'a RepoRef, _issue: u64) -> TrackerFuture<'a, Vec<Assignee>> {
        let res = self.enter("list_assignees").map(|s| s.assignees.clone());
        Box::pin(async move { res })
    }

    fn add_assignees<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _issue: u64,
        logins: &'a [String],
    ) -> TrackerFuture<'a, ()> {
        let res = self
            .enter("add_assignees")
            .map(|mut s| s.added_assignees.extend(logins.iter().cloned()));
        Box::pin(async move { res })
    }

    fn list_comments<'a>(&'a self, _repo: &'a RepoRef, _issue: u64) -> TrackerFuture<'a, Vec<Comment>> {
        let res = self.enter("list_comments").map(|s| s.comments.clone());
        Box::pin(async move { res })
    }

    fn create_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _issue: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, Comment> {
        let res = self.enter("create_comment").map(|mut s| {
            s.next_id += 1;
            let comment = Comment {
                id: s.next_id,
                author_is_bot: true,
                body: body.to_string(),
            };
            s.comments.push(comment.clone());
            comment
        });
        Box::pin(async move { res })
    }

    fn update_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        comment_id: u64,
        body: &'a str,
    ) -> TrackerFuture<'a, ()> {
        let res = self.enter("update_comment").and_then(|mut s| {
            match s.comments.iter_mut().find(|c| c.id == comment_id) {
                Some(c) => {
                    c.body = body.to_string();
                    Ok(())
                }
                None => Err(TrackerError::Provider(TrackerProviderError::NotFound)),
            }
        });
        Box::pin(async move { res })
    }

    fn delete_comment<'a>(&'a self, _repo: &'a RepoRef, comment_id: u64) -> TrackerFuture<'a, ()> {
        let res = self
            .enter("delete_comment")
            .map(|mut s| s.comments.retain(|c| c.id != comment_id));
        Box::pin(async move { res })
    }
}

impl PullRequestClient for FakeTracker {
    fn request_reviewers<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _pr: u64,
        reviewers: &'a [String],
    ) -> TrackerFuture<'a, u16> {
        let res = self.enter("request_reviewers").map(|mut s| {
            s.requested_reviewers.extend(reviewers.iter().cloned());
            201
        });
        Box::pin(async move { res })
    }

    fn get_pull_request<'a>(&'a self, _repo: &'a RepoRef, pr: u64) -> TrackerFuture<'a, PullRequest> {
        let res = self.enter("get_pull_request").and_then(|s| {
            s.pull
                .clone()
                .filter(|p| p.number == pr)
                .ok_or(TrackerError::Provider(TrackerProviderError::NotFound))
        });
        Box::pin(async move { res })
    }

    fn list_files<'a>(&'a self, _repo: &'a RepoRef, _pr: u64) -> TrackerFuture<'a, Vec<ChangedFile>> {
        let res = self.enter("list_files").map(|s| s.files.clone());
        Box::pin(async move { res })
    }

    fn update_body<'a>(&'a self, _repo: &'a RepoRef, _pr: u64, body: &'a str) -> TrackerFuture<'a, ()> {
        let res = self.enter("update_body").map(|mut s| {
            s.body_updates.push(body.to_string());
            if let Some(p) = s.pull.as_mut() {
                p.body = Some(body.to_string());
            }
        });
        Box::pin(async move { res })
    }
}

/// Generator answering every prompt through a closure.
pub struct ScriptedGenerator {
    respond: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// `respond` returning `None` makes the call fail.
    pub fn new(respond: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Some(text.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let res = (self.respond)(prompt).ok_or_else(|| {
            AiLlmError::Provider(ProviderError::new(
                Provider::AzureOpenAI,
                ProviderErrorKind::EmptyChoices,
            ))
        });
        Box::pin(async move { res })
    }
}

/// Generator whose calls never resolve.
pub struct StalledGenerator;

impl TextGenerator for StalledGenerator {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(std::future::pending())
    }
}
