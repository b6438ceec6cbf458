pub mod azure_openai_service;
mod http;
pub mod open_ai_service;
