//! Comment markers.
//!
//! Each review comment starts with a marker line that names the file it
//! belongs to. The marker is built from a template holding a `{filename}`
//! placeholder.

use crate::errors::{ReviewError, ReviewResult};

/// Placeholder substituted with the file name.
pub const FILENAME_PLACEHOLDER: &str = "{filename}";
/// Marker used when no `comment-marker` input is given.
pub const DEFAULT_MARKER_TEMPLATE: &str = "#### 🔍 PR Review Bot - {filename} 🖌";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMarker {
    prefix: String,
    suffix: String,
}

impl CommentMarker {
    /// Builds a marker from `template`.
    ///
    /// # Errors
    /// [`ReviewError::Config`] when the template does not contain
    /// `{filename}` exactly once or has nothing around it.
    pub fn new(template: impl Into<String>) -> ReviewResult<Self> {
        let template = template.into();
        let Some((prefix, suffix)) = template.split_once(FILENAME_PLACEHOLDER) else {
            return Err(ReviewError::Config(format!(
                "comment marker '{template}' must contain {FILENAME_PLACEHOLDER}"
            )));
        };
        if suffix.contains(FILENAME_PLACEHOLDER) {
            return Err(ReviewError::Config(format!(
                "comment marker '{template}' must contain {FILENAME_PLACEHOLDER} only once"
            )));
        }
        if prefix.trim().is_empty() {
            return Err(ReviewError::Config(format!(
                "comment marker '{template}' needs text before {FILENAME_PLACEHOLDER}"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Marker line for `filename`.
    pub fn for_file(&self, filename: &str) -> String {
        format!("{}{}{}", self.prefix, filename, self.suffix)
    }

    /// Full comment body: marker, blank line, review text.
    pub fn canonical_body(&self, filename: &str, text: &str) -> String {
        format!("{}\n\n{}", self.for_file(filename), text)
    }

    /// File named by the first marker found in `body`, if any.
    pub fn file_of(&self, body: &str) -> Option<String> {
        let start = body.find(&self.prefix)? + self.prefix.len();
        let line = body[start..].lines().next().unwrap_or("");
        let name = if self.suffix.is_empty() {
            line
        } else {
            &line[..line.find(&self.suffix)?]
        };
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl Default for CommentMarker {
    fn default() -> Self {
        let (prefix, suffix) = DEFAULT_MARKER_TEMPLATE
            .split_once(FILENAME_PLACEHOLDER)
            .unwrap_or((DEFAULT_MARKER_TEMPLATE, ""));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}
