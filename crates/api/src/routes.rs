//! HTTP route handlers for the API.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use wikiscribe_agents::{ArticleCrew, Process};
use wikiscribe_common::{
    Article, ArticleBrief, GenerationStatus, GenerationTask, ScribeError,
    article::MIN_SECTIONS,
    task::{DEFAULT_LANGUAGE, DEFAULT_MIN_WORDS},
};
use wikiscribe_llm::LlmProvider;

use crate::AppState;

pub const DEFAULT_SECTIONS_COUNT: usize = 3;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Wiki Article Generator API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn bad_request(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            code,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: error.into(),
            code: "NOT_FOUND",
        }
    }
}

impl From<ScribeError> for ErrorResponse {
    fn from(err: ScribeError) -> Self {
        let (status, code) = match &err {
            ScribeError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ScribeError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ScribeError::Config(_) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
            ScribeError::Llm(_) | ScribeError::LlmApi { .. } => {
                (StatusCode::BAD_GATEWAY, "LLM_ERROR")
            }
            ScribeError::Knowledge(_) => (StatusCode::BAD_GATEWAY, "KNOWLEDGE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        Self {
            status,
            error: err.to_string(),
            code,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

fn default_min_words() -> usize {
    DEFAULT_MIN_WORDS
}

fn default_sections_count() -> Option<usize> {
    Some(DEFAULT_SECTIONS_COUNT)
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_sections_count")]
    pub sections_count: Option<usize>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Provider override ("groq" or "gemini")
    #[serde(default)]
    pub llm: Option<String>,
    #[serde(default)]
    pub hierarchical: bool,
}

impl GenerateRequest {
    fn validate(&self) -> Result<(), ErrorResponse> {
        if self.topic.trim().is_empty() {
            return Err(ErrorResponse::bad_request("topic must not be empty", "INVALID_TOPIC"));
        }
        if self.min_words == 0 {
            return Err(ErrorResponse::bad_request(
                "min_words must be greater than zero",
                "INVALID_MIN_WORDS",
            ));
        }
        if let Some(count) = self.sections_count
            && count < MIN_SECTIONS
        {
            return Err(ErrorResponse::bad_request(
                format!("sections_count must be at least {MIN_SECTIONS}"),
                "INVALID_SECTIONS",
            ));
        }
        Ok(())
    }

    fn brief(&self) -> ArticleBrief {
        ArticleBrief::new(self.topic.trim())
            .with_min_words(self.min_words)
            .with_sections(self.sections_count)
            .with_language(self.language.trim().to_lowercase())
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub task_id: String,
    pub status: GenerationStatus,
    pub message: String,
}

/// Accept a generation request and run the crew in the background.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ErrorResponse> {
    request.validate()?;

    let provider = match request.llm.as_deref() {
        Some(name) => name
            .parse::<LlmProvider>()
            .map_err(|e| ErrorResponse::bad_request(e.to_string(), "INVALID_LLM"))?,
        None => state.llm_factory.default_provider(),
    };
    let process = Process::from_flag(request.hierarchical);
    let brief = request.brief();

    let task = GenerationTask::new(brief.topic.clone());
    let task_id = task.task_id.clone();
    state.tasks.insert(task).await;

    info!(
        task_id = %task_id,
        topic = %brief.topic,
        language = %brief.language,
        provider = %provider,
        process = %process,
        "Accepted generation request"
    );

    tokio::spawn(run_generation(
        state.clone(),
        task_id.clone(),
        brief.clone(),
        provider,
        process,
    ));

    Ok(Json(GenerateResponse {
        message: format!(
            "Article generation for '{}' started. Use the task_id to check its status.",
            brief.topic
        ),
        task_id,
        status: GenerationStatus::Processing,
    }))
}

async fn run_generation(
    state: Arc<AppState>,
    task_id: String,
    brief: ArticleBrief,
    provider: LlmProvider,
    process: Process,
) {
    let outcome = match state.llm_factory.build(provider) {
        Ok(llm) => {
            ArticleCrew::new(llm, state.knowledge.clone())
                .with_process(process)
                .run(&brief)
                .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(output) => {
            info!(
                task_id = %task_id,
                word_count = output.article.word_count,
                processing_time = output.processing_time_secs,
                "Generation completed"
            );
            state
                .tasks
                .complete(&task_id, output.article, output.processing_time_secs)
                .await;
        }
        Err(e) => {
            error!(task_id = %task_id, error = %e, "Generation failed");
            state.tasks.fail(&task_id, e.to_string()).await;
        }
    }
}

/// Status payload. Fields appear according to the task's state.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: GenerationStatus,
    pub topic: String,
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GenerationTask> for StatusResponse {
    fn from(task: GenerationTask) -> Self {
        let message = match task.status {
            GenerationStatus::Processing => Some("Article generation in progress".to_string()),
            _ => None,
        };
        Self {
            task_id: task.task_id,
            status: task.status,
            topic: task.topic,
            created_at: task.created_at,
            message,
            completed_at: task.completed_at,
            processing_time: task.processing_time,
            article: task.result,
            error: task.error,
        }
    }
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    debug!(task_id = %task_id, "Getting task status");

    let task = state
        .tasks
        .get(&task_id)
        .await
        .ok_or_else(|| ErrorResponse::not_found(format!("Task {task_id} not found")))?;

    Ok(Json(task.into()))
}
