//! LLM backends for the article crew.
//!
//! Two providers are supported: Groq (OpenAI-compatible chat completions) and
//! Google Gemini. Both are wrapped in a [`RetryingClient`] and handed out by a
//! [`ClientFactory`].

pub mod client;
pub mod config;
pub mod gemini;
pub mod groq;
pub mod retry;

pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage, http_client};
pub use config::{
    ClientFactory, ConfiguredClientFactory, DEFAULT_LLM_ENV, LlmConfig, LlmProvider,
    ProviderSettings, build_llm_client,
};
pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use retry::{RetryConfig, RetryingClient};
