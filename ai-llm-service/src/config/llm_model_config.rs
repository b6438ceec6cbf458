use crate::{
    config::llm_provider::LlmProvider,
    error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32},
};

/// Default completion budget used by the review prompts.
pub const DEFAULT_MAX_TOKENS: u32 = 256;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Default Azure OpenAI REST API version for the completions endpoint.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for a text generation backend.
///
/// # Fields
///
/// - `provider`: which backend to call.
/// - `model`: Azure deployment name or OpenAI model id.
/// - `endpoint`: base URL, e.g. `https://my-resource.openai.azure.com`.
/// - `api_key`: secret for the backend.
/// - `api_version`: Azure `api-version` query parameter (ignored by OpenAI).
/// - `max_tokens`: completion length bound.
/// - `temperature`: sampling temperature.
/// - `timeout_secs`: per-request timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Azure OpenAI config with the bot's defaults (256 tokens, temperature 0.5).
    pub fn azure(endpoint: impl Into<String>, api_key: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::AzureOpenAI,
            model: deployment.into(),
            endpoint: endpoint.into(),
            api_key: Some(api_key.into()),
            api_version: Some(DEFAULT_AZURE_API_VERSION.to_string()),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Checks the fields every provider relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] when `model` is blank
    /// - [`ConfigError::InvalidFormat`] when `endpoint` is not http(s)
    /// - [`ConfigError::OutOfRange`] when `temperature` is outside `0.0..=2.0`
    ///   or `max_tokens` is zero
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "max_tokens",
                detail: "expected a positive number",
            }
            .into());
        }
        Ok(())
    }
}
