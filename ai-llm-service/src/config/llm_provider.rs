use std::{fmt, str::FromStr};

use crate::error_handler::{AiLlmError, ConfigError};

/// Backend used for text generation.
///
/// - `AzureOpenAI` talks to an Azure OpenAI deployment through the legacy
///   completions endpoint (`/openai/deployments/{model}/completions`).
/// - `OpenAI` talks to the public OpenAI chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Azure-hosted OpenAI deployment (`api-key` header auth).
    AzureOpenAI,
    /// Public OpenAI API (Bearer auth).
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" | "azure-openai" | "azureopenai" => Ok(Self::AzureOpenAI),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureOpenAI => f.write_str("azure"),
            Self::OpenAI => f.write_str("openai"),
        }
    }
}
