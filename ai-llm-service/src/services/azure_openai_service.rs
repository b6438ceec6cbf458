//! Azure OpenAI service for single-shot text completions.
//!
//! - POST {endpoint}/openai/deployments/{model}/completions?api-version={api_version}
//! - `api-key` header auth
//!
//! The first choice is returned with surrounding whitespace trimmed.

use std::time::Instant;

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::http::ProviderHttp;
use crate::{
    config::llm_model_config::{DEFAULT_AZURE_API_VERSION, LlmModelConfig},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
};

/// Client for one Azure OpenAI completions deployment.
#[derive(Debug)]
pub struct AzureOpenAiService {
    http: ProviderHttp,
    cfg: LlmModelConfig,
    url_completions: String,
}

impl AzureOpenAiService {
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider`, `MissingApiKey` or `InvalidEndpoint`
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let http = ProviderHttp::new(
            Provider::AzureOpenAI,
            &cfg,
            HeaderName::from_static("api-key"),
            |key| key.to_string(),
        )?;

        let api_version = cfg.api_version.as_deref().unwrap_or(DEFAULT_AZURE_API_VERSION);
        let url_completions = format!(
            "{}/openai/deployments/{}/completions?api-version={}",
            http.base, cfg.model, api_version
        );

        info!(
            deployment = %cfg.model,
            endpoint = %http.base,
            timeout_secs = http.timeout.as_secs(),
            "AzureOpenAiService initialized"
        );

        Ok(Self {
            http,
            cfg,
            url_completions,
        })
    }

    /// Performs one completion request for `prompt`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Timeout`] when the request exceeds the configured timeout
    /// - [`AiLlmError::HttpTransport`] for other client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` or `EmptyChoices` for unusable bodies
    pub async fn complete(&self, prompt: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = CompletionRequest {
            prompt: [prompt],
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
        };

        let out: CompletionResponse = self
            .http
            .post_json(&self.url_completions, &body, &self.cfg.model, "choices[0].text")
            .await?;

        let text = out
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ProviderError::new(Provider::AzureOpenAI, ProviderErrorKind::EmptyChoices))?;

        info!(
            deployment = %self.cfg.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "completion finished"
        );

        Ok(text.trim().to_string())
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}
