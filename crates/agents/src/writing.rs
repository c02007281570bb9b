//! Writer agent - turns research into a structured article draft.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use wikiscribe_common::{
    Agent, AgentConfig, AgentMessage, AgentRole, ArticleBrief, Result, ScribeError, Task,
};
use wikiscribe_llm::LlmClient;

use crate::chat::ask;
use crate::parsing::parse_json;
use crate::research::ResearchResult;

/// Sections requested when the brief does not name a count.
pub const DEFAULT_MIN_SECTIONS: usize = 3;

const WRITER_TITLE: &str = "Article Writer";
const WRITER_GOAL: &str = "Create informative, engaging and well-structured articles";
const WRITER_BACKSTORY: &str = "You are a professional content writer experienced in \
informative, engaging articles. You turn raw research into cohesive, well-structured text \
adapted to a general audience.";

/// JSON layout shared by the writer and editor prompts.
pub(crate) const ARTICLE_JSON_FORMAT: &str = r#"```json
{
  "title": "Article title",
  "summary": "Summary of the article in about 150 words",
  "sections": [
    {"title": "Section 1 title", "content": "Section 1 content"},
    {"title": "Section 2 title", "content": "Section 2 content"}
  ],
  "metadata": {
    "keywords": ["keyword1", "keyword2"],
    "sources": ["Source 1", "Source 2"]
  }
}
```"#;

pub struct WriterAgent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl WriterAgent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(Self::default_config(), llm)
    }

    pub fn default_config() -> AgentConfig {
        AgentConfig::new(AgentRole::Writer, WRITER_TITLE, WRITER_GOAL, WRITER_BACKSTORY)
    }

    fn task_prompt(research: &ResearchResult, brief: &ArticleBrief) -> String {
        let topic = &brief.topic;

        let mut sections = String::new();
        for (i, section) in research.main_sections.iter().enumerate() {
            let _ = write!(
                sections,
                "\n**Section {}:** {}\n{}\n",
                i + 1,
                section.title,
                section.content
            );
        }
        let sources: Vec<String> = research.sources.iter().map(|s| format!("- {s}")).collect();

        let section_rule = match brief.sections_count {
            Some(n) => format!("exactly {n} sections with relevant headings"),
            None => format!("at least {DEFAULT_MIN_SECTIONS} sections with relevant headings"),
        };

        format!(
            r#"# Writing task: an article about "{topic}"

## Research

### Topic summary
{summary}

### Detailed sections
{sections}

### Related keywords
{keywords}

### Sources consulted
{sources}

## Instructions
1. Write a complete article about "{topic}" with at least {min_words} words.
2. Write it in the language whose ISO code is "{language}".
3. The article must include a clear title, an introduction that sets the context,
   {section_rule}, and a conclusion that ties the main ideas together.
4. Use the research but do not copy it verbatim; rewrite it in your own words.
5. Keep the language clear, informative and accessible, and use the keywords naturally.
6. Avoid needless repetition and keep the sections cohesive.

## Output format
Answer with JSON only, in this structure:
{format}

Do not mention that the article was generated or that it is based on research."#,
            summary = research.summary,
            keywords = research.keywords.join(", "),
            sources = sources.join("\n"),
            min_words = brief.min_words,
            language = brief.language,
            format = ARTICLE_JSON_FORMAT,
        )
    }
}

#[async_trait]
impl Agent for WriterAgent {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> AgentRole {
        AgentRole::Writer
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn process_task(&self, task: &Task) -> Result<AgentMessage> {
        info!(
            agent = %self.id(),
            task_id = %task.id,
            min_words = task.brief.min_words,
            "Processing writing task"
        );

        let context = task
            .context
            .as_deref()
            .ok_or_else(|| ScribeError::Agent("Writing task has no research context".into()))?;
        let research: ResearchResult = parse_json(context)?;

        let prompt = format!(
            "{}\n\n{}",
            task.description,
            Self::task_prompt(&research, &task.brief)
        );
        let draft = ask(self.llm.as_ref(), &self.config, prompt).await?;

        Ok(AgentMessage::from_agent(self.id(), draft).for_task(&task.id))
    }
}
