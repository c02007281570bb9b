//! Researcher agent - gathers Wikipedia material for a topic.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wikiscribe_common::{
    Agent, AgentConfig, AgentMessage, AgentRole, ArticleSection, Result, ScribeError, Task,
};
use wikiscribe_llm::LlmClient;
use wikiscribe_wiki::{KnowledgeSource, WikiSection};

use crate::chat::ask;
use crate::parsing::parse_json;

pub const SEARCH_LIMIT: usize = 5;
pub const SUMMARY_PAGES: usize = 3;
pub const CONTENT_PAGES: usize = 2;

/// Per-section cap on dossier text so prompts stay within context limits.
const MAX_SECTION_CHARS: usize = 1500;
const MAX_SECTIONS_PER_PAGE: usize = 8;

const RESEARCHER_TITLE: &str = "Information Researcher";
const RESEARCHER_GOAL: &str =
    "Collect comprehensive and accurate information about the requested topic";
const RESEARCHER_BACKSTORY: &str = "You are a researcher specialised in gathering information \
from Wikipedia. You find relevant, reliable and detailed material on any subject and organise \
it so a writer can turn it into an informative, accurate article.";

/// Structured research handed from the researcher to the writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub main_sections: Vec<ArticleSection>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

pub struct ResearcherAgent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    source: Arc<dyn KnowledgeSource>,
}

impl ResearcherAgent {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        source: Arc<dyn KnowledgeSource>,
    ) -> Self {
        Self {
            config,
            llm,
            source,
        }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>, source: Arc<dyn KnowledgeSource>) -> Self {
        Self::new(Self::default_config(), llm, source)
    }

    pub fn default_config() -> AgentConfig {
        AgentConfig::new(
            AgentRole::Researcher,
            RESEARCHER_TITLE,
            RESEARCHER_GOAL,
            RESEARCHER_BACKSTORY,
        )
        .with_temperature(0.3)
    }

    /// Search, then read summaries and sectioned content of the best hits.
    /// Returns the dossier text and the titles that were actually read.
    async fn gather(&self, topic: &str, language: &str) -> Result<(String, Vec<String>)> {
        let hits = self.source.search(language, topic, SEARCH_LIMIT).await?;
        if hits.is_empty() {
            return Err(ScribeError::Agent(format!(
                "No Wikipedia results for '{topic}' ({language})"
            )));
        }

        info!(agent = %self.id(), topic, hits = hits.len(), "Wikipedia search finished");

        let mut dossier = String::new();
        let mut consulted: Vec<String> = Vec::new();

        let _ = writeln!(dossier, "## Search results");
        for hit in &hits {
            let _ = writeln!(dossier, "- {}: {}", hit.title, hit.snippet);
        }

        for hit in hits.iter().take(SUMMARY_PAGES) {
            match self.source.summary(language, &hit.title).await {
                Ok(page) => {
                    let _ = write!(dossier, "\n## Summary: {}\n{}\n", page.title, page.summary.trim());
                    push_unique(&mut consulted, page.title);
                }
                Err(e) => warn!(title = %hit.title, error = %e, "Skipping page summary"),
            }
        }

        for hit in hits.iter().take(CONTENT_PAGES) {
            match self.source.content(language, &hit.title).await {
                Ok(page) => {
                    let _ = write!(dossier, "\n## Content: {}\n", page.title);
                    for section in page.sections().iter().take(MAX_SECTIONS_PER_PAGE) {
                        write_section(&mut dossier, section);
                    }
                    push_unique(&mut consulted, page.title);
                }
                Err(e) => warn!(title = %hit.title, error = %e, "Skipping page content"),
            }
        }

        Ok((dossier, consulted))
    }

    fn task_prompt(topic: &str, dossier: &str) -> String {
        format!(
            r#"# Research on "{topic}"

## Material collected from Wikipedia
{dossier}

## Instructions
1. Use the material above to build comprehensive research on "{topic}".
2. Write a summary of the topic and organise the details into main sections.
3. Extract keywords and list the sources consulted.
4. Do not invent facts that are not supported by the material.

## Output format
Answer with JSON only:
```json
{{
  "topic": "{topic}",
  "summary": "...",
  "main_sections": [{{"title": "...", "content": "..."}}],
  "keywords": ["..."],
  "sources": ["..."]
}}
```"#
        )
    }
}

fn push_unique(titles: &mut Vec<String>, title: String) {
    if !titles.contains(&title) {
        titles.push(title);
    }
}

fn write_section(out: &mut String, section: &WikiSection) {
    let body: String = section.content.chars().take(MAX_SECTION_CHARS).collect();
    let _ = write!(out, "### {}\n{}\n", section.title, body);
}

#[async_trait]
impl Agent for ResearcherAgent {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> AgentRole {
        AgentRole::Researcher
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn process_task(&self, task: &Task) -> Result<AgentMessage> {
        let brief = &task.brief;
        info!(
            agent = %self.id(),
            task_id = %task.id,
            topic = %brief.topic,
            language = %brief.language,
            "Processing research task"
        );

        let (dossier, consulted) = self.gather(&brief.topic, &brief.language).await?;

        let mut prompt = Self::task_prompt(&brief.topic, &dossier);
        if !task.description.is_empty() {
            prompt = format!("{}\n\n{prompt}", task.description);
        }

        let raw = ask(self.llm.as_ref(), &self.config, prompt).await?;
        let mut research: ResearchResult = parse_json(&raw)?;
        research.topic = brief.topic.clone();
        research.sources = consulted;

        let content = serde_json::to_string_pretty(&research)?;
        Ok(AgentMessage::from_agent(self.id(), content).for_task(&task.id))
    }
}
