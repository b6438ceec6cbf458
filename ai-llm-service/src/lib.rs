//! Text generation for the review bot.
//!
//! - [`LlmService`]: enum dispatch over Azure OpenAI completions and OpenAI chat.
//! - [`LlmModelConfig`]: provider, deployment/model, limits and timeout.
//! - [`AiLlmError`]: unified error type.
//! - [`telemetry`]: tracing layer and filter helpers shared by the workspace.

pub mod config;
pub mod error_handler;
pub mod llm_service;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use llm_service::LlmService;
