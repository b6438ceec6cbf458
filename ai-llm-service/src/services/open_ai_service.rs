//! OpenAI (ChatGPT) service for text generation.
//!
//! - POST {endpoint}/v1/chat/completions, one user message, non-streaming
//! - Bearer auth

use std::time::Instant;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::http::ProviderHttp;
use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
};

/// Client for the public OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAiService {
    http: ProviderHttp,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider`, `MissingApiKey` or `InvalidEndpoint`
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let http = ProviderHttp::new(Provider::OpenAI, &cfg, AUTHORIZATION, |key| format!("Bearer {key}"))?;
        let url_chat = format!("{}/v1/chat/completions", http.base);

        info!(
            model = %cfg.model,
            endpoint = %http.base,
            timeout_secs = http.timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self { http, cfg, url_chat })
    }

    /// Chat completion with `prompt` as the single user message.
    ///
    /// # Errors
    /// Same as [`super::azure_openai_service::AzureOpenAiService::complete`].
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt);

        let out: ChatCompletionResponse = self
            .http
            .post_json(&self.url_chat, &body, &self.cfg.model, "choices[0].message.content")
            .await?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion finished"
        );

        Ok(content.trim().to_string())
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
