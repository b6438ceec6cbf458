//! Crate-wide error hierarchy for pr-reviewer.
//!
//! - `Validation`: the event cannot be processed (wrong type, no PR number).
//! - `Upstream`: the tracker answered with a non-2xx status or failed in transit.
//! - `Policy`: the pull request is over the changed-lines limit.
//! - `Generation`: the text generator failed; aborts the run.

use std::time::Duration;

use ai_llm_service::AiLlmError;
use pr_tracker::TrackerError;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Event cannot be handled by this bot.
    #[error("validation error: {0}")]
    Validation(String),

    /// Tracker call failed.
    #[error("tracker error: {0}")]
    Upstream(#[from] TrackerError),

    /// Changed-lines policy violation.
    #[error("the pull request has too many changes: {changed} changed lines exceed the limit of {limit}")]
    Policy { changed: u64, limit: u64 },

    /// Text generation failed.
    #[error("text generation failed: {0}")]
    Generation(#[from] AiLlmError),

    /// Missing or invalid inputs / environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// The whole run exceeded its time budget.
    #[error("run timed out after {0:?}")]
    Timeout(Duration),

    /// Reading the event payload or writing outputs failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The event payload is not valid JSON.
    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}
