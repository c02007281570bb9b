//! Integration tests for the article crew.
//!
//! The LLM and Wikipedia are replaced by in-memory fakes so the whole
//! pipeline runs without network access.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use wikiscribe_agents::{ArticleCrew, Process, ResearchResult, extract_json};
use wikiscribe_common::{ArticleBrief, Result, ScribeError};
use wikiscribe_llm::{LlmClient, LlmRequest, LlmResponse};
use wikiscribe_wiki::{KnowledgeSource, PageContent, PageSummary, SearchHit};

/// Answers according to which agent is asking (matched on the system prompt).
struct RoleRoutedLlm {
    manager_verdicts: Vec<&'static str>,
    manager_calls: AtomicUsize,
    writer_calls: AtomicUsize,
    fail_writer: bool,
}

impl RoleRoutedLlm {
    fn new() -> Self {
        Self {
            manager_verdicts: vec![r#"{"approved": true, "feedback": ""}"#],
            manager_calls: AtomicUsize::new(0),
            writer_calls: AtomicUsize::new(0),
            fail_writer: false,
        }
    }

    fn with_manager_verdicts(mut self, verdicts: Vec<&'static str>) -> Self {
        self.manager_verdicts = verdicts;
        self
    }

    fn failing_writer(mut self) -> Self {
        self.fail_writer = true;
        self
    }

    fn article() -> String {
        let paragraph = "Lisbon is the capital and largest city of Portugal, built on seven \
                         hills along the Tagus estuary and shaped by centuries of trade. ";
        json!({
            "title": "Lisbon",
            "summary": paragraph.repeat(2),
            "sections": [
                {"title": "History", "content": paragraph.repeat(3)},
                {"title": "Geography", "content": paragraph.repeat(3)},
                {"title": "Culture", "content": paragraph.repeat(3)}
            ],
            "metadata": {"keywords": ["Lisbon", "Portugal"], "sources": ["Lisboa"]}
        })
        .to_string()
    }
}

#[async_trait]
impl LlmClient for RoleRoutedLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let system = request.system_prompt.unwrap_or_default();
        let content = if system.starts_with("You are Information Researcher") {
            json!({
                "topic": "Lisbon",
                "summary": "Capital of Portugal.",
                "main_sections": [{"title": "History", "content": "Roman era onwards."}],
                "keywords": ["Lisbon"],
                "sources": []
            })
            .to_string()
        } else if system.starts_with("You are Article Writer") {
            self.writer_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writer {
                return Err(ScribeError::Llm("Groq API error 401 Unauthorized".into()));
            }
            Self::article()
        } else if system.starts_with("You are Content Editor") {
            format!("Revised article:\n```json\n{}\n```", Self::article())
        } else {
            let n = self.manager_calls.fetch_add(1, Ordering::SeqCst);
            let i = n.min(self.manager_verdicts.len() - 1);
            self.manager_verdicts[i].to_string()
        };

        Ok(LlmResponse {
            content,
            model: "routed".into(),
            usage: None,
            finish_reason: None,
        })
    }

    fn model_name(&self) -> &str {
        "routed"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

struct OnePageWiki;

#[async_trait]
impl KnowledgeSource for OnePageWiki {
    async fn search(&self, language: &str, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
        if language != "pt" {
            return Ok(Vec::new());
        }
        Ok(vec![SearchHit {
            title: "Lisboa".into(),
            snippet: format!("{query} é a capital"),
            pageid: 1,
        }])
    }

    async fn summary(&self, _language: &str, title: &str) -> Result<PageSummary> {
        Ok(PageSummary {
            title: title.into(),
            summary: "Lisboa é a capital de Portugal.".into(),
            pageid: 1,
        })
    }

    async fn content(&self, _language: &str, title: &str) -> Result<PageContent> {
        Ok(PageContent {
            title: title.into(),
            content: "Intro.\n== História ==\nFundada antes dos romanos.".into(),
            pageid: 1,
        })
    }
}

fn brief() -> ArticleBrief {
    ArticleBrief::new("Lisboa").with_min_words(100)
}

#[tokio::test]
async fn test_sequential_crew_end_to_end() {
    let crew = ArticleCrew::new(Arc::new(RoleRoutedLlm::new()), Arc::new(OnePageWiki));

    let output = crew.run(&brief()).await.unwrap();
    let article = output.article;

    assert_eq!(article.topic, "Lisboa");
    assert_eq!(article.language, "pt");
    assert_eq!(article.sections.len(), 3);
    assert!(article.word_count >= 100);
    assert_eq!(article.metadata.keywords, vec!["Lisbon", "Portugal"]);
}

#[tokio::test]
async fn test_hierarchical_crew_revises_and_accepts() {
    let llm = Arc::new(RoleRoutedLlm::new().with_manager_verdicts(vec![
        r#"{"approved": true}"#,
        r#"{"approved": false, "feedback": "Add a culture section"}"#,
        r#"{"approved": true}"#,
    ]));
    let crew = ArticleCrew::new(llm.clone(), Arc::new(OnePageWiki))
        .with_process(Process::Hierarchical);

    let output = crew.run(&brief()).await.unwrap();

    assert_eq!(output.article.title, "Lisbon");
    // research, writer, writer revision, editor
    assert_eq!(llm.manager_calls.load(Ordering::SeqCst), 4);
    assert_eq!(llm.writer_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hierarchical_revision_limit_is_respected() {
    let llm = Arc::new(
        RoleRoutedLlm::new()
            .with_manager_verdicts(vec![r#"{"approved": false, "feedback": "Never good enough"}"#]),
    );
    let crew = ArticleCrew::new(llm.clone(), Arc::new(OnePageWiki))
        .with_process(Process::Hierarchical)
        .with_max_revisions(2);

    crew.run(&brief()).await.unwrap();

    assert_eq!(llm.writer_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_llm_failure_fails_the_crew() {
    let crew = ArticleCrew::new(
        Arc::new(RoleRoutedLlm::new().failing_writer()),
        Arc::new(OnePageWiki),
    );

    let err = crew.run(&brief()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_language_selects_wikipedia_edition() {
    let crew = ArticleCrew::new(Arc::new(RoleRoutedLlm::new()), Arc::new(OnePageWiki));

    let err = crew.run(&brief().with_language("en")).await.unwrap_err();
    assert!(err.to_string().contains("No Wikipedia results"));
}

#[test]
fn test_research_result_round_trips_through_extraction() {
    let text = "```json\n{\"topic\": \"x\", \"summary\": \"y\"}\n```";
    let research: ResearchResult = serde_json::from_value(extract_json(text).unwrap()).unwrap();
    assert_eq!(research.summary, "y");
    assert!(research.main_sections.is_empty());
}
