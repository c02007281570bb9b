//! Application state for the API server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::error;
use wikiscribe_common::{Article, GenerationTask, Result};
use wikiscribe_llm::{ClientFactory, ConfiguredClientFactory, LlmConfig};
use wikiscribe_wiki::{KnowledgeSource, WikipediaClient};

/// In-memory generation jobs, keyed by task id. Entries live for the
/// lifetime of the process.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, GenerationTask>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task: GenerationTask) {
        self.tasks.write().await.insert(task.task_id.clone(), task);
    }

    pub async fn get(&self, task_id: &str) -> Option<GenerationTask> {
        self.tasks.read().await.get(task_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn complete(&self, task_id: &str, article: Article, processing_time: f64) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(task_id) else {
            error!(task_id, "Completed task is not in the store");
            return;
        };
        if let Err(e) = task.complete(article, processing_time) {
            error!(task_id, error = %e, "Could not record completion");
        }
    }

    pub async fn fail(&self, task_id: &str, message: impl Into<String>) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(task_id) else {
            error!(task_id, "Failed task is not in the store");
            return;
        };
        if let Err(e) = task.fail(message) {
            error!(task_id, error = %e, "Could not record failure");
        }
    }
}

/// Shared application state for the API server.
pub struct AppState {
    pub tasks: TaskStore,

    /// Builds the LLM client for the provider a request asks for
    pub llm_factory: Arc<dyn ClientFactory>,

    pub knowledge: Arc<dyn KnowledgeSource>,

    /// Server start time (for health checks)
    pub start_time: Instant,
}

impl AppState {
    pub fn new(llm_factory: Arc<dyn ClientFactory>, knowledge: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            tasks: TaskStore::new(),
            llm_factory,
            knowledge,
            start_time: Instant::now(),
        }
    }

    /// Real providers and Wikipedia, sharing the configured request timeout.
    pub fn from_config(config: LlmConfig) -> Result<Self> {
        let wikipedia = WikipediaClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(
            Arc::new(ConfiguredClientFactory::new(config)),
            Arc::new(wikipedia),
        ))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
