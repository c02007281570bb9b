//! Task types: pipeline tasks handed to agents and generation jobs tracked by the API.

use crate::article::Article;
use crate::{Result, ScribeError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_WORDS: usize = 300;
pub const DEFAULT_LANGUAGE: &str = "pt";

/// What the crew is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleBrief {
    pub topic: String,
    pub min_words: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_count: Option<usize>,
    pub language: String,
}

impl ArticleBrief {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            min_words: DEFAULT_MIN_WORDS,
            sections_count: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    pub fn with_sections(mut self, sections_count: Option<usize>) -> Self {
        self.sections_count = sections_count;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Status of a pipeline task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A unit of work assigned to one agent. Its output feeds the next task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    /// Instruction for the agent
    pub description: String,

    /// What a good answer looks like (used by the manager in hierarchical mode)
    pub expected_output: String,

    pub brief: ArticleBrief,

    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<String>,

    /// Output of the previous stage, plus coordinator feedback on revisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    pub created_at: u64,
}

impl Task {
    pub fn new(description: impl Into<String>, brief: ArticleBrief) -> Self {
        Self {
            id: format!("task_{}", uuid::Uuid::new_v4()),
            description: description.into(),
            expected_output: String::new(),
            brief,
            status: TaskStatus::Pending,
            assigned_agent: None,
            context: None,
            created_at: crate::now_millis(),
        }
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn assigned_to(mut self, agent: impl Into<String>) -> Self {
        self.assigned_agent = Some(agent.into());
        self
    }
}

/// Status of a generation job. Transitions are one-way out of `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::Processing => write!(f, "processing"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A generation job submitted through the API. Lives for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: String,
    pub status: GenerationStatus,
    pub topic: String,

    /// Unix millis
    pub created_at: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,

    /// Seconds, rounded to two decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Article>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationTask {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            task_id: format!("task_{}", uuid::Uuid::new_v4()),
            status: GenerationStatus::Processing,
            topic: topic.into(),
            created_at: crate::now_millis(),
            completed_at: None,
            processing_time: None,
            result: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != GenerationStatus::Processing
    }

    /// Record a finished article. Fails if the task already left `Processing`.
    pub fn complete(&mut self, article: Article, processing_time: f64) -> Result<()> {
        self.ensure_processing(GenerationStatus::Completed)?;
        self.status = GenerationStatus::Completed;
        self.result = Some(article);
        self.completed_at = Some(crate::now_millis());
        self.processing_time = Some(round_secs(processing_time));
        Ok(())
    }

    /// Record a failure. Fails if the task already left `Processing`.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        self.ensure_processing(GenerationStatus::Failed)?;
        let now = crate::now_millis();
        self.status = GenerationStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        self.processing_time = Some(round_secs(
            now.saturating_sub(self.created_at) as f64 / 1000.0,
        ));
        Ok(())
    }

    fn ensure_processing(&self, target: GenerationStatus) -> Result<()> {
        if self.is_finished() {
            return Err(ScribeError::InvalidTransition(format!(
                "task {} is {}, cannot move to {}",
                self.task_id, self.status, target
            )));
        }
        Ok(())
    }
}

pub(crate) fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
