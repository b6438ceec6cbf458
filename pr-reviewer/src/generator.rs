//! Text generator seam.
//!
//! The pipeline only needs "prompt in, text out". Production code plugs in
//! [`ai_llm_service::LlmService`]; tests plug in scripted generators.

use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, LlmService};

/// Boxed, sendable future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Single-shot completion backend.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}

impl TextGenerator for LlmService {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(LlmService::generate(self, prompt))
    }
}
