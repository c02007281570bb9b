//! Common types and traits shared across wikiscribe crates.
//!
//! This crate provides the article model, task types, agent abstractions and
//! the error type every other crate returns.

pub mod article;
pub mod error;
pub mod message;
pub mod task;
pub mod traits;

pub use article::{Article, ArticleDraft, ArticleMetadata, ArticleSection, DraftMetadata};
pub use error::{Result, ScribeError};
pub use message::{AgentMessage, MessageRole};
pub use task::{ArticleBrief, GenerationStatus, GenerationTask, Task, TaskStatus};
pub use traits::{Agent, AgentConfig, AgentRole};

/// Current time as Unix millis.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
