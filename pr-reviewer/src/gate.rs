//! Changed-files gate: fetches the files of a pull request and enforces the
//! changed-lines policy.

use pr_tracker::{ChangedFile, PullRequestClient, RepoRef};
use tracing::{debug, warn};

use crate::{
    errors::{ReviewError, ReviewResult},
    report::Reporter,
};

/// Largest accepted `additions + deletions + changes` sum.
pub const DEFAULT_MAX_CHANGED_LINES: u64 = 2048;

/// Every file changed by `pr`. A failed listing is returned as
/// [`ReviewError::Upstream`]; the caller decides how to report it.
pub async fn fetch_changed_files(
    pulls: &dyn PullRequestClient,
    repo: &RepoRef,
    pr: u64,
) -> ReviewResult<Vec<ChangedFile>> {
    let files = pulls.list_files(repo, pr).await?;
    debug!(pr, count = files.len(), "changed files fetched");
    Ok(files)
}

/// Sum of `additions + deletions + changes` over `files`, saturating.
pub fn total_changed_lines(files: &[ChangedFile]) -> u64 {
    files.iter().fold(0u64, |acc, f| {
        acc.saturating_add(f.additions)
            .saturating_add(f.deletions)
            .saturating_add(f.changes)
    })
}

/// `true` when the pull request is within `limit`; otherwise reports the
/// violation and returns `false`.
pub fn check_size_limit(files: &[ChangedFile], limit: u64, reporter: &Reporter) -> bool {
    let changed = total_changed_lines(files);
    if changed > limit {
        warn!(changed, limit, "changed-lines limit exceeded");
        reporter.fail(ReviewError::Policy { changed, limit }.to_string());
        return false;
    }
    debug!(changed, limit, "changed-lines check passed");
    true
}
