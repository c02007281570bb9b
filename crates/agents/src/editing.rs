//! Editor agent - revises the writer's draft.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use wikiscribe_common::{
    Agent, AgentConfig, AgentMessage, AgentRole, ArticleBrief, ArticleDraft, Result, ScribeError,
    Task,
};
use wikiscribe_llm::LlmClient;

use crate::chat::ask;
use crate::parsing::parse_json;
use crate::writing::ARTICLE_JSON_FORMAT;

const EDITOR_TITLE: &str = "Content Editor";
const EDITOR_GOAL: &str =
    "Review and improve articles to guarantee quality, accuracy and engagement";
const EDITOR_BACKSTORY: &str = "You are a professional editor with years of experience \
revising content. You spot problems of coherence, grammar and consistency and turn good \
articles into excellent ones.";

pub struct EditorAgent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl EditorAgent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(Self::default_config(), llm)
    }

    pub fn default_config() -> AgentConfig {
        AgentConfig::new(AgentRole::Editor, EDITOR_TITLE, EDITOR_GOAL, EDITOR_BACKSTORY)
            .with_temperature(0.5)
    }

    fn task_prompt(draft: &ArticleDraft, brief: &ArticleBrief) -> String {
        let mut body = String::new();
        for section in &draft.sections {
            let _ = write!(body, "\n## {}\n{}\n", section.title, section.content);
        }
        let sources: Vec<String> = draft
            .metadata
            .sources
            .iter()
            .map(|s| format!("- {s}"))
            .collect();

        format!(
            r#"# Editing task: revise and improve the article

## Original article

### Title
{title}

### Summary
{summary}

### Content
{body}

### Metadata
**Keywords:** {keywords}

**Sources:**
{sources}

## Editing instructions
1. Fix grammar, spelling and punctuation; improve clarity and flow.
2. Remove redundancy and check coherence between paragraphs and sections.
3. Sharpen the section titles.
4. Make sure the article has at least {min_words} words and stays in the language
   whose ISO code is "{language}".
5. Keep an informative, professional but accessible tone, preferring the active voice.

## Output format
Keep the same JSON structure with the revised content:
{format}

Do not add notes about the changes. Return only the revised article as JSON."#,
            title = draft.title,
            summary = draft.summary,
            keywords = draft.metadata.keywords.join(", "),
            sources = sources.join("\n"),
            min_words = brief.min_words,
            language = brief.language,
            format = ARTICLE_JSON_FORMAT,
        )
    }
}

#[async_trait]
impl Agent for EditorAgent {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> AgentRole {
        AgentRole::Editor
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn process_task(&self, task: &Task) -> Result<AgentMessage> {
        info!(agent = %self.id(), task_id = %task.id, "Processing editing task");

        let context = task
            .context
            .as_deref()
            .ok_or_else(|| ScribeError::Agent("Editing task has no draft context".into()))?;
        let draft: ArticleDraft = parse_json(context)?;

        let prompt = format!(
            "{}\n\n{}",
            task.description,
            Self::task_prompt(&draft, &task.brief)
        );
        let revised = ask(self.llm.as_ref(), &self.config, prompt).await?;

        Ok(AgentMessage::from_agent(self.id(), revised).for_task(&task.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    const DRAFT: &str = r#"Here you go:
```json
{"title": "Rust", "summary": "A language.",
 "sections": [{"title": "Origins", "content": "Mozilla research."}],
 "metadata": {"keywords": ["rust"], "sources": ["Rust"], "generated_at": "now"}}
```"#;

    #[tokio::test]
    async fn prompt_is_built_from_fenced_draft() {
        let llm = Arc::new(ScriptedLlm::new(vec!["{}"]));
        let agent = EditorAgent::with_default_config(llm.clone());
        let task = Task::new(
            "Revise the article",
            ArticleBrief::new("Rust").with_min_words(400),
        )
        .with_context(DRAFT);

        agent.process_task(&task).await.unwrap();

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.starts_with("Revise the article"));
        assert!(prompt.contains("## Origins\nMozilla research."));
        assert!(prompt.contains("at least 400 words"));
        assert!(prompt.contains("**Keywords:** rust"));
    }

    #[tokio::test]
    async fn non_json_draft_is_parse_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let agent = EditorAgent::with_default_config(llm.clone());
        let task = Task::new("Revise", ArticleBrief::new("Rust")).with_context("no json here");

        let err = agent.process_task(&task).await.unwrap_err();
        assert!(matches!(err, ScribeError::Parse(_)));
        assert_eq!(llm.calls(), 0);
    }
}
