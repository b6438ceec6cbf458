//! Per-file review comments.
//!
//! For every changed file the reconciler generates a review text and brings
//! the bot's comments for that file to one canonical comment (or none when
//! the text is empty).
//!
//! - Planning is pure: [`claim_comments`] assigns each bot comment to at most
//!   one file, [`plan_file`] turns a file's text and comments into a
//!   [`FilePlan`].
//! - Applying is separate: [`apply_plan`] issues the writes in plan order, or
//!   only logs them in dry-run mode.
//! - Files are processed with bounded concurrency; actions of one file run
//!   sequentially (update before deletes).

pub mod marker;

use std::{
    collections::{HashMap, HashSet},
    time::Instant,
};

use futures::{StreamExt, TryStreamExt, stream};
use pr_tracker::{ChangedFile, Comment, IssueClient, RepoRef};
use tracing::{debug, info, warn};

use crate::{
    errors::{ReviewError, ReviewResult},
    generator::TextGenerator,
    inputs::ReviewSettings,
    prompt::PromptBuilder,
    report::{Reporter, TEXT_OUTPUT},
    text::sanitize,
};

use self::marker::CommentMarker;

/// One write against the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    Create { body: String },
    Update { comment_id: u64, body: String },
    Delete { comment_id: u64 },
}

/// Ordered actions for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    pub filename: String,
    pub actions: Vec<CommentAction>,
}

/// Counters over applied (or, in dry-run mode, planned) actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    /// Actions only logged because comment writes are disabled.
    pub skipped: usize,
}

impl ApplyStats {
    fn merge(mut self, other: ApplyStats) -> Self {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self
    }
}

/// Assigns every bot comment to at most one of `files`: the file whose
/// marker occurs earliest in the body (longest marker on ties). Human
/// comments are never claimed.
pub fn claim_comments<'c>(
    comments: &'c [Comment],
    files: &[ChangedFile],
    marker: &CommentMarker,
) -> HashMap<String, Vec<&'c Comment>> {
    let markers: Vec<(&str, String)> = files
        .iter()
        .map(|f| (f.filename.as_str(), marker.for_file(&f.filename)))
        .collect();

    let mut claimed: HashMap<String, Vec<&Comment>> = HashMap::new();
    for comment in comments.iter().filter(|c| c.author_is_bot) {
        let owner = markers
            .iter()
            .filter_map(|(name, m)| comment.body.find(m.as_str()).map(|pos| (pos, m.len(), *name)))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        if let Some((_, _, name)) = owner {
            claimed.entry(name.to_string()).or_default().push(comment);
        }
    }
    claimed
}

/// Decides the writes for one file given its sanitized review `text` and the
/// bot comments claimed for it.
///
/// | text      | candidates | actions                        |
/// |-----------|------------|--------------------------------|
/// | empty     | 0          | none                           |
/// | empty     | ≥1         | delete all                     |
/// | non-empty | 0          | create canonical               |
/// | non-empty | ≥1         | update first, delete the rest  |
pub fn plan_file(
    filename: &str,
    text: &str,
    candidates: &[&Comment],
    marker: &CommentMarker,
) -> FilePlan {
    let actions = if text.is_empty() {
        candidates
            .iter()
            .map(|c| CommentAction::Delete { comment_id: c.id })
            .collect()
    } else {
        let body = marker.canonical_body(filename, text);
        match candidates.split_first() {
            None => vec![CommentAction::Create { body }],
            Some((first, rest)) => std::iter::once(CommentAction::Update {
                comment_id: first.id,
                body,
            })
            .chain(rest.iter().map(|c| CommentAction::Delete { comment_id: c.id }))
            .collect(),
        }
    };

    FilePlan {
        filename: filename.to_string(),
        actions,
    }
}

/// Deletes for bot comments whose marker names a file that is no longer in
/// `files`.
pub fn plan_stale(comments: &[Comment], files: &[ChangedFile], marker: &CommentMarker) -> Vec<CommentAction> {
    let current: HashSet<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    let claimed: HashSet<u64> = claim_comments(comments, files, marker)
        .values()
        .flatten()
        .map(|c| c.id)
        .collect();

    comments
        .iter()
        .filter(|c| c.author_is_bot && !claimed.contains(&c.id))
        .filter(|c| {
            marker
                .file_of(&c.body)
                .is_some_and(|name| !current.contains(name.as_str()))
        })
        .map(|c| CommentAction::Delete { comment_id: c.id })
        .collect()
}

/// Applies `actions` in order. Each failed write is reported and does not
/// stop the remaining ones. With `dry_run` nothing is sent.
pub async fn apply_plan(
    issues: &dyn IssueClient,
    repo: &RepoRef,
    pr: u64,
    filename: &str,
    actions: &[CommentAction],
    dry_run: bool,
    reporter: &Reporter,
) -> ApplyStats {
    let mut stats = ApplyStats::default();
    for action in actions {
        if dry_run {
            info!(pr, file = filename, ?action, "comment writes disabled, skipping action");
            stats.skipped += 1;
            continue;
        }

        let res = match action {
            CommentAction::Create { body } => issues.create_comment(repo, pr, body).await.map(|c| {
                debug!(pr, file = filename, comment_id = c.id, "review comment created");
                stats.created += 1;
            }),
            CommentAction::Update { comment_id, body } => {
                issues.update_comment(repo, *comment_id, body).await.map(|()| {
                    debug!(pr, file = filename, comment_id, "review comment updated");
                    stats.updated += 1;
                })
            }
            CommentAction::Delete { comment_id } => {
                issues.delete_comment(repo, *comment_id).await.map(|()| {
                    debug!(pr, file = filename, comment_id, "review comment deleted");
                    stats.deleted += 1;
                })
            }
        };

        if let Err(e) = res {
            warn!(pr, file = filename, ?action, error = %e, "comment write failed");
            reporter.fail(format!("failed to apply {} for {filename}: {e}", action_name(action)));
            stats.failed += 1;
        }
    }
    stats
}

fn action_name(action: &CommentAction) -> &'static str {
    match action {
        CommentAction::Create { .. } => "comment create",
        CommentAction::Update { .. } => "comment update",
        CommentAction::Delete { .. } => "comment delete",
    }
}

/// Everything the reconciler needs for one pull request.
pub struct Reconciler<'a> {
    pub issues: &'a dyn IssueClient,
    pub generator: &'a dyn TextGenerator,
    pub prompts: &'a dyn PromptBuilder,
    pub settings: &'a ReviewSettings,
    pub reporter: &'a Reporter,
    pub repo: &'a RepoRef,
    pub pr: u64,
}

impl Reconciler<'_> {
    /// Reviews every file in `changed_files` and reconciles the bot comments
    /// in `existing`. A failed generation aborts the whole pass.
    pub async fn reconcile(
        &self,
        existing: &[Comment],
        changed_files: &[ChangedFile],
    ) -> ReviewResult<ApplyStats> {
        let t0 = Instant::now();
        let files = dedup_files(changed_files);
        let marker = &self.settings.marker;
        let dry_run = !self.settings.bot_comment;
        info!(pr = self.pr, files = files.len(), dry_run, "reconcile start");

        let mut claimed = claim_comments(existing, &files, marker);
        let jobs: Vec<(&ChangedFile, Vec<&Comment>)> = files
            .iter()
            .map(|f| (f, claimed.remove(&f.filename).unwrap_or_default()))
            .collect();

        let per_file: Vec<ApplyStats> = stream::iter(jobs)
            .map(|(file, candidates)| self.review_file(file, candidates))
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .try_collect()
            .await?;
        let mut stats = per_file.into_iter().fold(ApplyStats::default(), ApplyStats::merge);

        if self.settings.prune_stale_comments {
            let stale = plan_stale(existing, &files, marker);
            if !stale.is_empty() {
                info!(pr = self.pr, count = stale.len(), "pruning stale review comments");
            }
            let pruned =
                apply_plan(self.issues, self.repo, self.pr, "(stale)", &stale, dry_run, self.reporter).await;
            stats = stats.merge(pruned);
        }

        info!(
            pr = self.pr,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            failed = stats.failed,
            skipped = stats.skipped,
            latency_ms = t0.elapsed().as_millis() as u64,
            "reconcile done"
        );
        Ok(stats)
    }

    async fn review_file(&self, file: &ChangedFile, candidates: Vec<&Comment>) -> ReviewResult<ApplyStats> {
        let prompt = self.prompts.review_prompt(&file.filename, self.pr);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(ReviewError::Generation)?;
        let text = sanitize(&raw);
        if !text.is_empty() {
            self.reporter.set_output(TEXT_OUTPUT, &text);
        }

        let plan = plan_file(&file.filename, &text, &candidates, &self.settings.marker);
        debug!(
            pr = self.pr,
            file = %file.filename,
            candidates = candidates.len(),
            actions = plan.actions.len(),
            "file planned"
        );

        Ok(apply_plan(
            self.issues,
            self.repo,
            self.pr,
            &plan.filename,
            &plan.actions,
            !self.settings.bot_comment,
            self.reporter,
        )
        .await)
    }
}

/// Keeps the first occurrence of each filename.
fn dedup_files(files: &[ChangedFile]) -> Vec<ChangedFile> {
    let mut seen = HashSet::new();
    files
        .iter()
        .filter(|f| seen.insert(f.filename.as_str()))
        .cloned()
        .collect()
}
