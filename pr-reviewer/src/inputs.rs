//! Action inputs.
//!
//! The Actions runner exposes each `with:` input as `INPUT_<NAME>` (name
//! uppercased, spaces replaced by `_`, hyphens kept). Everything is parsed
//! and validated here, before any network call, into [`Inputs`].
//!
//! Parsing goes through a lookup closure so tests never touch the process
//! environment.

use ai_llm_service::{
    LlmModelConfig, LlmProvider,
    config::llm_model_config::{
        DEFAULT_AZURE_API_VERSION, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
    },
};
use pr_tracker::TrackerConfig;

use crate::{
    errors::{ReviewError, ReviewResult},
    gate::DEFAULT_MAX_CHANGED_LINES,
    reconcile::marker::{CommentMarker, DEFAULT_MARKER_TEMPLATE},
};

/// Public OpenAI endpoint used when `llm-provider` is `openai` and no
/// endpoint input is given.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
/// Default upper bound for the whole run.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Settings that drive the review pipeline.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    /// Apply comment writes; otherwise plan and log only.
    pub bot_comment: bool,
    pub marker: CommentMarker,
    pub max_changed_lines: u64,
    pub reviewers: Vec<String>,
    /// Files reviewed concurrently; always at least 1.
    pub max_concurrency: usize,
    /// Delete bot comments for files no longer in the pull request.
    pub prune_stale_comments: bool,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            bot_comment: false,
            marker: CommentMarker::default(),
            max_changed_lines: DEFAULT_MAX_CHANGED_LINES,
            reviewers: Vec::new(),
            max_concurrency: 1,
            prune_stale_comments: false,
        }
    }
}

/// Every input of one run, validated.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub llm: LlmModelConfig,
    pub review: ReviewSettings,
    /// `github-token`, falling back to `GITHUB_TOKEN`.
    pub github_token: Option<String>,
    /// `openai-prompt`, used by the standalone completion mode.
    pub prompt: Option<String>,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
}

impl Inputs {
    /// Reads inputs from the process environment.
    pub fn from_env() -> ReviewResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads inputs through `lookup`, which maps a raw environment variable
    /// name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReviewResult<Self> {
        let input = |name: &str| {
            lookup(&input_var(name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match input("llm-provider") {
            Some(raw) => raw
                .parse::<LlmProvider>()
                .map_err(|e| ReviewError::Config(e.to_string()))?,
            None => LlmProvider::AzureOpenAI,
        };

        let model = must_input(&input, "model")?;
        let (endpoint, api_key) = match provider {
            LlmProvider::AzureOpenAI => (
                must_input(&input, "azure-openai-endpoint")?,
                must_input(&input, "azure-openai-api-key")?,
            ),
            LlmProvider::OpenAI => (
                input("azure-openai-endpoint").unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string()),
                must_input(&input, "openai-api-key")?,
            ),
        };

        let request_timeout_secs =
            parse_input::<u64>(&input, "request-timeout-secs")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let run_timeout_secs =
            parse_input::<u64>(&input, "run-timeout-secs")?.unwrap_or(DEFAULT_RUN_TIMEOUT_SECS);
        if request_timeout_secs == 0 || run_timeout_secs == 0 {
            return Err(ReviewError::Config("timeouts must be positive".into()));
        }

        let llm = LlmModelConfig {
            provider,
            model,
            endpoint,
            api_key: Some(api_key),
            api_version: Some(
                input("azure-openai-api-version")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            ),
            max_tokens: Some(parse_input::<u32>(&input, "max-tokens")?.unwrap_or(DEFAULT_MAX_TOKENS)),
            temperature: Some(
                parse_input::<f32>(&input, "temperature")?.unwrap_or(DEFAULT_TEMPERATURE),
            ),
            timeout_secs: Some(request_timeout_secs),
        };
        llm.validate()
            .map_err(|e| ReviewError::Config(e.to_string()))?;

        let marker = match input("comment-marker") {
            Some(template) => CommentMarker::new(template)?,
            None => CommentMarker::new(DEFAULT_MARKER_TEMPLATE)?,
        };

        let max_concurrency = parse_input::<usize>(&input, "max-concurrency")?.unwrap_or(1);
        if max_concurrency == 0 {
            return Err(ReviewError::Config(
                "input 'max-concurrency' must be at least 1".into(),
            ));
        }

        let review = ReviewSettings {
            // Only `true` enables writes, after trimming; case matters.
            bot_comment: input("bot-comment").as_deref() == Some("true"),
            marker,
            max_changed_lines: parse_input::<u64>(&input, "max-changed-lines")?
                .unwrap_or(DEFAULT_MAX_CHANGED_LINES),
            reviewers: input("reviewers")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            max_concurrency,
            prune_stale_comments: parse_bool(&input, "prune-stale-comments")?.unwrap_or(false),
        };

        let github_token = input("github-token").or_else(|| {
            lookup("GITHUB_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

        Ok(Self {
            llm,
            review,
            github_token,
            prompt: input("openai-prompt"),
            request_timeout_secs,
            run_timeout_secs,
        })
    }

    /// Tracker client configuration for `api_url`.
    ///
    /// # Errors
    /// [`ReviewError::Config`] when neither `github-token` nor `GITHUB_TOKEN`
    /// is set.
    pub fn tracker_config(&self, api_url: &str) -> ReviewResult<TrackerConfig> {
        let token = self.github_token.clone().ok_or_else(|| {
            ReviewError::Config("missing input 'github-token' (or GITHUB_TOKEN)".into())
        })?;
        Ok(TrackerConfig {
            base_api: api_url.to_string(),
            token,
            timeout_secs: self.request_timeout_secs,
        })
    }
}

/// Environment variable name the runner uses for input `name`.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn must_input(input: &impl Fn(&str) -> Option<String>, name: &str) -> ReviewResult<String> {
    input(name).ok_or_else(|| ReviewError::Config(format!("missing required input '{name}'")))
}

fn parse_input<T: std::str::FromStr>(
    input: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> ReviewResult<Option<T>> {
    match input(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ReviewError::Config(format!("input '{name}' has an invalid value '{raw}'"))),
    }
}

fn parse_bool(input: &impl Fn(&str) -> Option<String>, name: &str) -> ReviewResult<Option<bool>> {
    match input(name).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v == "true" => Ok(Some(true)),
        Some(v) if v == "false" => Ok(Some(false)),
        Some(v) => Err(ReviewError::Config(format!(
            "input '{name}' expects true or false, got '{v}'"
        ))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn azure_base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("INPUT_AZURE-OPENAI-API-KEY", "secret"),
            ("INPUT_AZURE-OPENAI-ENDPOINT", "https://res.openai.azure.com"),
            ("INPUT_MODEL", "gpt-35"),
        ]
    }

    #[test]
    fn input_var_follows_runner_convention() {
        assert_eq!(input_var("bot-comment"), "INPUT_BOT-COMMENT");
        assert_eq!(input_var("my input"), "INPUT_MY_INPUT");
    }

    #[test]
    fn defaults_are_applied() {
        let inputs = Inputs::from_lookup(lookup(&azure_base())).unwrap();
        assert_eq!(inputs.llm.provider, LlmProvider::AzureOpenAI);
        assert_eq!(inputs.llm.max_tokens, Some(256));
        assert_eq!(inputs.llm.temperature, Some(0.5));
        assert_eq!(inputs.llm.api_version.as_deref(), Some("2024-02-01"));
        assert!(!inputs.review.bot_comment);
        assert_eq!(inputs.review.max_changed_lines, 2048);
        assert!(inputs.review.reviewers.is_empty());
        assert_eq!(inputs.review.max_concurrency, 1);
        assert_eq!(inputs.review.marker.for_file("a.rs"), "#### 🔍 PR Review Bot - a.rs 🖌");
        assert_eq!(inputs.run_timeout_secs, 300);
        assert_eq!(inputs.github_token, None);
    }

    #[test]
    fn only_trimmed_true_enables_comment_writes() {
        for (raw, expected) in [
            ("true", true),
            ("true ", true),
            ("true\n", true),
            ("True", false),
            ("yes", false),
            ("", false),
        ] {
            let mut pairs = azure_base();
            pairs.push(("INPUT_BOT-COMMENT", raw));
            let inputs = Inputs::from_lookup(lookup(&pairs)).unwrap();
            assert_eq!(inputs.review.bot_comment, expected, "raw value {raw:?}");
        }
    }

    #[test]
    fn parses_lists_numbers_and_token_fallback() {
        let mut pairs = azure_base();
        pairs.extend([
            ("INPUT_REVIEWERS", " alice, ,bob "),
            ("INPUT_MAX-CHANGED-LINES", "100"),
            ("INPUT_MAX-CONCURRENCY", "4"),
            ("INPUT_PRUNE-STALE-COMMENTS", "TRUE"),
            ("GITHUB_TOKEN", "ghs_x"),
        ]);
        let inputs = Inputs::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(inputs.review.reviewers, vec!["alice", "bob"]);
        assert_eq!(inputs.review.max_changed_lines, 100);
        assert_eq!(inputs.review.max_concurrency, 4);
        assert!(inputs.review.prune_stale_comments);

        let cfg = inputs.tracker_config("https://api.github.com").unwrap();
        assert_eq!(cfg.token, "ghs_x");
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn missing_required_input_is_config_error() {
        let err = Inputs::from_lookup(lookup(&[("INPUT_MODEL", "m")])).unwrap_err();
        assert!(matches!(err, ReviewError::Config(ref m) if m.contains("azure-openai-endpoint")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("INPUT_TEMPERATURE", "2.5"),
            ("INPUT_MAX-TOKENS", "many"),
            ("INPUT_MAX-CONCURRENCY", "0"),
            ("INPUT_COMMENT-MARKER", "no placeholder"),
            ("INPUT_LLM-PROVIDER", "ollama"),
        ] {
            let mut pairs = azure_base();
            pairs.push((key, value));
            assert!(Inputs::from_lookup(lookup(&pairs)).is_err(), "{key}={value} accepted");
        }
    }

    #[test]
    fn openai_provider_uses_public_endpoint_by_default() {
        let inputs = Inputs::from_lookup(lookup(&[
            ("INPUT_LLM-PROVIDER", "openai"),
            ("INPUT_OPENAI-API-KEY", "sk-x"),
            ("INPUT_MODEL", "gpt-4o-mini"),
        ]))
        .unwrap();
        assert_eq!(inputs.llm.provider, LlmProvider::OpenAI);
        assert_eq!(inputs.llm.endpoint, DEFAULT_OPENAI_ENDPOINT);
        assert!(inputs.tracker_config("https://api.github.com").is_err());
    }
}
