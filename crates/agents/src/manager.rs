//! Manager agent - reviews stage outputs in hierarchical mode.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wikiscribe_common::{Agent, AgentConfig, AgentMessage, AgentRole, Result, ScribeError, Task};
use wikiscribe_llm::LlmClient;

use crate::chat::ask;
use crate::parsing::parse_json;

/// Stage output longer than this is cut before review.
const MAX_REVIEW_CHARS: usize = 12_000;

const MANAGER_TITLE: &str = "Editorial Manager";
const MANAGER_GOAL: &str =
    "Coordinate the crew so the final article is accurate, complete and well written";
const MANAGER_BACKSTORY: &str = "You are an experienced editorial manager. You check each \
deliverable against what was asked for and send it back with precise feedback when it falls \
short.";

/// Verdict on one stage output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default = "approved_by_default")]
    pub approved: bool,
    #[serde(default)]
    pub feedback: String,
}

fn approved_by_default() -> bool {
    true
}

impl Review {
    pub fn approved() -> Self {
        Self {
            approved: true,
            feedback: String::new(),
        }
    }
}

pub struct ManagerAgent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl ManagerAgent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(Self::default_config(), llm)
    }

    pub fn default_config() -> AgentConfig {
        AgentConfig::new(
            AgentRole::Manager,
            MANAGER_TITLE,
            MANAGER_GOAL,
            MANAGER_BACKSTORY,
        )
        .with_temperature(0.2)
        .with_max_tokens(1024)
    }

    /// Review `output`, produced for `task` by `agent_name`.
    pub async fn review(&self, task: &Task, agent_name: &str, output: &AgentMessage) -> Result<Review> {
        let review_task = Task::new(
            format!("Review the output of {agent_name} for: {}", task.description),
            task.brief.clone(),
        )
        .with_expected_output(task.expected_output.clone())
        .with_context(output.content.clone())
        .assigned_to(self.id());

        let message = self.process_task(&review_task).await?;
        Ok(parse_review(&message.content))
    }

    fn task_prompt(task: &Task, output: &str) -> String {
        let output: String = output.chars().take(MAX_REVIEW_CHARS).collect();
        format!(
            r#"# {description}

## Expected output
{expected}

## Requirements
- Topic: "{topic}"
- At least {min_words} words in the final article
- Language code: "{language}"

## Output to review
{output}

## Answer
Reply with JSON only:
```json
{{"approved": true, "feedback": "what must change if not approved"}}
```"#,
            description = task.description,
            expected = task.expected_output,
            topic = task.brief.topic,
            min_words = task.brief.min_words,
            language = task.brief.language,
        )
    }
}

/// Unparseable reviews count as approval so a chatty manager cannot stall the crew.
fn parse_review(text: &str) -> Review {
    match parse_json::<Review>(text) {
        Ok(review) => review,
        Err(e) => {
            warn!(error = %e, "Manager review was not valid JSON, treating as approved");
            Review::approved()
        }
    }
}

#[async_trait]
impl Agent for ManagerAgent {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> AgentRole {
        AgentRole::Manager
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn process_task(&self, task: &Task) -> Result<AgentMessage> {
        info!(agent = %self.id(), task_id = %task.id, "Reviewing stage output");

        let output = task
            .context
            .as_deref()
            .ok_or_else(|| ScribeError::Agent("Review task has nothing to review".into()))?;

        let verdict = ask(self.llm.as_ref(), &self.config, Self::task_prompt(task, output)).await?;
        debug!(agent = %self.id(), verdict = %verdict, "Manager verdict");

        Ok(AgentMessage::from_agent(self.id(), verdict).for_task(&task.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use wikiscribe_common::ArticleBrief;

    fn stage_task() -> Task {
        Task::new("Write the article", ArticleBrief::new("Rust"))
            .with_expected_output("Article JSON with title, summary, sections and metadata")
    }

    #[test]
    fn parses_rejection_with_feedback() {
        let review = parse_review(r#"{"approved": false, "feedback": "Too short"}"#);
        assert!(!review.approved);
        assert_eq!(review.feedback, "Too short");
    }

    #[test]
    fn prose_review_counts_as_approval() {
        assert_eq!(parse_review("Looks great to me!"), Review::approved());
    }

    #[test]
    fn missing_approved_field_defaults_to_true() {
        assert!(parse_review(r#"{"feedback": "minor nits"}"#).approved);
    }

    #[tokio::test]
    async fn review_sends_expected_output_and_stage_output() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"approved": false, "feedback": "Add a conclusion"}"#,
        ]));
        let manager = ManagerAgent::with_default_config(llm.clone());
        let output = AgentMessage::from_agent("writer", "{\"title\": \"Rust\"}");

        let review = manager
            .review(&stage_task(), "Article Writer", &output)
            .await
            .unwrap();

        assert!(!review.approved);
        assert_eq!(review.feedback, "Add a conclusion");

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Review the output of Article Writer"));
        assert!(prompt.contains("Article JSON with title, summary"));
        assert!(prompt.contains("{\"title\": \"Rust\"}"));
    }
}
