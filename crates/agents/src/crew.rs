//! The article crew: researcher, writer and editor run as one pipeline.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wikiscribe_common::{Agent, Article, ArticleBrief, ArticleDraft, Result, ScribeError, Task};
use wikiscribe_llm::LlmClient;
use wikiscribe_wiki::KnowledgeSource;

use crate::editing::EditorAgent;
use crate::manager::ManagerAgent;
use crate::parsing::parse_json;
use crate::research::ResearcherAgent;
use crate::workflow::{DEFAULT_MAX_REVISIONS, HierarchicalWorkflow, SequentialWorkflow, Workflow};
use crate::writing::WriterAgent;

/// How the crew's stages are coordinated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    #[default]
    Sequential,
    Hierarchical,
}

impl Process {
    pub fn from_flag(hierarchical: bool) -> Self {
        if hierarchical {
            Process::Hierarchical
        } else {
            Process::Sequential
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Process::Sequential => "sequential",
            Process::Hierarchical => "hierarchical",
        }
    }
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Process {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Process::Sequential),
            "hierarchical" => Ok(Process::Hierarchical),
            other => Err(ScribeError::Config(format!("Unknown process: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrewOutput {
    pub article: Article,
    /// Wall-clock seconds, rounded to two decimals
    pub processing_time_secs: f64,
}

pub struct ArticleCrew {
    llm: Arc<dyn LlmClient>,
    source: Arc<dyn KnowledgeSource>,
    process: Process,
    max_revisions: u32,
}

impl ArticleCrew {
    pub fn new(llm: Arc<dyn LlmClient>, source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            llm,
            source,
            process: Process::default(),
            max_revisions: DEFAULT_MAX_REVISIONS,
        }
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    pub fn process(&self) -> Process {
        self.process
    }

    fn research_task(brief: &ArticleBrief) -> Task {
        Task::new(
            format!(
                "Research information about '{}' on Wikipedia ({}).",
                brief.topic, brief.language
            ),
            brief.clone(),
        )
        .with_expected_output("Structured research with summary, main sections, keywords and sources")
    }

    fn writing_task(brief: &ArticleBrief) -> Task {
        Task::new(
            format!(
                "Write an article of at least {} words using the research.",
                brief.min_words
            ),
            brief.clone(),
        )
        .with_expected_output("Complete article in JSON with title, summary, sections and metadata")
    }

    fn editing_task(brief: &ArticleBrief) -> Task {
        Task::new(
            format!(
                "Review and improve the article, keeping at least {} words.",
                brief.min_words
            ),
            brief.clone(),
        )
        .with_expected_output("Revised and improved article in the same JSON format")
    }

    fn workflow(&self, brief: &ArticleBrief) -> Box<dyn Workflow> {
        let researcher: Arc<dyn Agent> = Arc::new(ResearcherAgent::with_default_config(
            self.llm.clone(),
            self.source.clone(),
        ));
        let writer: Arc<dyn Agent> = Arc::new(WriterAgent::with_default_config(self.llm.clone()));
        let editor: Arc<dyn Agent> = Arc::new(EditorAgent::with_default_config(self.llm.clone()));

        match self.process {
            Process::Sequential => Box::new(
                SequentialWorkflow::new("article-crew")
                    .add_stage(researcher, Self::research_task(brief))
                    .add_stage(writer, Self::writing_task(brief))
                    .add_stage(editor, Self::editing_task(brief)),
            ),
            Process::Hierarchical => {
                let manager = Arc::new(ManagerAgent::with_default_config(self.llm.clone()));
                Box::new(
                    HierarchicalWorkflow::new("article-crew", manager)
                        .with_max_revisions(self.max_revisions)
                        .add_stage(researcher, Self::research_task(brief))
                        .add_stage(writer, Self::writing_task(brief))
                        .add_stage(editor, Self::editing_task(brief)),
                )
            }
        }
    }

    /// Run the full pipeline and return a validated article.
    pub async fn run(&self, brief: &ArticleBrief) -> Result<CrewOutput> {
        let start = Instant::now();
        info!(
            topic = %brief.topic,
            language = %brief.language,
            min_words = brief.min_words,
            process = %self.process,
            provider = %self.llm.provider_name(),
            model = %self.llm.model_name(),
            "Starting article crew"
        );

        let output = self.workflow(brief).run().await?.into_output()?;
        let draft: ArticleDraft = parse_json(&output.content)?;
        let article = Article::from_draft(draft, brief.topic.clone(), brief.language.clone())?;

        if !article.meets_min_words(brief.min_words) {
            warn!(
                topic = %brief.topic,
                word_count = article.word_count,
                min_words = brief.min_words,
                "Article is shorter than requested"
            );
        }

        let processing_time_secs = (start.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            topic = %brief.topic,
            word_count = article.word_count,
            sections = article.sections.len(),
            processing_time_secs,
            "Article crew finished"
        );

        Ok(CrewOutput {
            article,
            processing_time_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeKnowledge, ScriptedLlm};

    const RESEARCH: &str = r#"{"topic": "Rust", "summary": "Rust is a language.",
        "main_sections": [{"title": "History", "content": "Mozilla."}],
        "keywords": ["rust"], "sources": []}"#;

    fn article_json(section_body: &str) -> String {
        let summary = "Rust is a general-purpose programming language emphasizing performance, \
                       type safety and concurrency without a garbage collector.";
        serde_json::json!({
            "title": "Rust",
            "summary": summary,
            "sections": [
                {"title": "History", "content": section_body},
                {"title": "Design", "content": section_body}
            ],
            "metadata": {"keywords": ["rust"], "sources": ["Rust"]}
        })
        .to_string()
    }

    fn long_body() -> String {
        "Rust grew out of a personal project at Mozilla Research and reached 1.0 in 2015. "
            .repeat(2)
    }

    #[test]
    fn process_parses_and_displays() {
        assert_eq!("Hierarchical".parse::<Process>().unwrap(), Process::Hierarchical);
        assert_eq!(Process::from_flag(false), Process::Sequential);
        assert_eq!(Process::Hierarchical.to_string(), "hierarchical");
        assert!("parallel".parse::<Process>().is_err());
    }

    #[tokio::test]
    async fn sequential_run_produces_validated_article() {
        let draft = article_json(&long_body());
        let edited = format!("```json\n{}\n```", article_json(&long_body()));
        let llm = Arc::new(ScriptedLlm::new(vec![RESEARCH, draft.as_str(), edited.as_str()]));
        let source = Arc::new(FakeKnowledge::with_pages(&["Rust", "Cargo"]));

        let crew = ArticleCrew::new(llm.clone(), source);
        let brief = ArticleBrief::new("Rust").with_language("en").with_min_words(10);
        let output = crew.run(&brief).await.unwrap();

        assert_eq!(output.article.topic, "Rust");
        assert_eq!(output.article.language, "en");
        assert_eq!(output.article.sections.len(), 2);
        assert!(output.article.meets_min_words(10));
        assert!(output.processing_time_secs >= 0.0);
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn invalid_final_article_is_validation_error() {
        let short = article_json("too short");
        let llm = Arc::new(ScriptedLlm::new(vec![RESEARCH, short.as_str(), short.as_str()]));
        let source = Arc::new(FakeKnowledge::with_pages(&["Rust"]));

        let err = ArticleCrew::new(llm, source)
            .run(&ArticleBrief::new("Rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
    }

    #[tokio::test]
    async fn research_failure_surfaces_as_agent_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let source = Arc::new(FakeKnowledge::with_pages(&[]));

        let err = ArticleCrew::new(llm, source)
            .run(&ArticleBrief::new("Nothing"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No Wikipedia results"));
    }

    #[tokio::test]
    async fn hierarchical_run_consults_manager_per_stage() {
        let body = long_body();
        let draft = article_json(&body);
        let approve = r#"{"approved": true, "feedback": ""}"#;
        let llm = Arc::new(ScriptedLlm::new(vec![
            RESEARCH,
            approve,
            draft.as_str(),
            approve,
            draft.as_str(),
            approve,
        ]));
        let source = Arc::new(FakeKnowledge::with_pages(&["Rust"]));

        let output = ArticleCrew::new(llm.clone(), source)
            .with_process(Process::Hierarchical)
            .run(&ArticleBrief::new("Rust"))
            .await
            .unwrap();

        assert_eq!(output.article.title, "Rust");
        assert_eq!(llm.calls(), 6);
        let managers = llm
            .system_prompts()
            .iter()
            .filter(|p| p.starts_with("You are Editorial Manager"))
            .count();
        assert_eq!(managers, 3);
    }
}
