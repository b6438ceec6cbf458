//! Provider-agnostic text generation with enum dispatch.
//!
//! Construct once from a validated [`LlmModelConfig`] and share by reference
//! (or `Arc`) with every caller that needs completions. The concrete HTTP
//! client is built up front so configuration errors surface before any
//! request is made.

use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{azure_openai_service::AzureOpenAiService, open_ai_service::OpenAiService},
};

/// Concrete text generator selected by [`LlmProvider`].
#[derive(Debug)]
pub enum LlmService {
    AzureOpenAI(AzureOpenAiService),
    OpenAI(OpenAiService),
}

impl LlmService {
    /// Validates `cfg` and builds the matching provider client.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for invalid fields and
    /// [`AiLlmError::Provider`] for provider-specific setup failures.
    pub fn from_config(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        debug!(provider = %cfg.provider, model = %cfg.model, "initializing LLM service");

        Ok(match cfg.provider {
            LlmProvider::AzureOpenAI => Self::AzureOpenAI(AzureOpenAiService::new(cfg)?),
            LlmProvider::OpenAI => Self::OpenAI(OpenAiService::new(cfg)?),
        })
    }

    /// Single-shot completion; the returned text is already trimmed.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        match self {
            Self::AzureOpenAI(s) => s.complete(prompt).await,
            Self::OpenAI(s) => s.generate(prompt).await,
        }
    }

    /// Backend in use.
    pub fn provider(&self) -> LlmProvider {
        match self {
            Self::AzureOpenAI(_) => LlmProvider::AzureOpenAI,
            Self::OpenAI(_) => LlmProvider::OpenAI,
        }
    }
}
