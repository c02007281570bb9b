//! Error types for wikiscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Non-success HTTP status from a provider API.
    #[error("LLM error: {provider} API error {status}: {message}")]
    LlmApi {
        provider: String,
        status: u16,
        /// Seconds from the `Retry-After` header, when the provider sent one
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("Knowledge source error: {0}")]
    Knowledge(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScribeError>;
