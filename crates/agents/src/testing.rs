//! Fakes shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use wikiscribe_common::{Result, ScribeError};
use wikiscribe_llm::{LlmClient, LlmRequest, LlmResponse};
use wikiscribe_wiki::{KnowledgeSource, PageContent, PageSummary, SearchHit};

/// Replies with canned responses in order and records every request.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }

    /// User prompts in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.system_prompt.clone())
            .collect()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ScribeError::Llm("script exhausted".into()))?;
        Ok(LlmResponse {
            content,
            model: "scripted".into(),
            usage: None,
            finish_reason: Some("stop".into()),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// In-memory encyclopedia: every listed title is a hit for any query.
pub struct FakeKnowledge {
    titles: Vec<String>,
    summary_calls: AtomicUsize,
    content_calls: AtomicUsize,
    languages: Mutex<Vec<String>>,
}

impl FakeKnowledge {
    pub fn with_pages(titles: &[&str]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            summary_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    /// Distinct languages requested.
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }

    fn note_language(&self, language: &str) {
        let mut seen = self.languages.lock().unwrap();
        if !seen.iter().any(|l| l == language) {
            seen.push(language.to_string());
        }
    }
}

#[async_trait]
impl KnowledgeSource for FakeKnowledge {
    async fn search(&self, language: &str, _query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.note_language(language);
        Ok(self
            .titles
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, title)| SearchHit {
                title: title.clone(),
                snippet: format!("{title} snippet"),
                pageid: i as u64 + 1,
            })
            .collect())
    }

    async fn summary(&self, language: &str, title: &str) -> Result<PageSummary> {
        self.note_language(language);
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageSummary {
            title: title.to_string(),
            summary: format!("{title} is a well documented subject."),
            pageid: 1,
        })
    }

    async fn content(&self, language: &str, title: &str) -> Result<PageContent> {
        self.note_language(language);
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageContent {
            title: title.to_string(),
            content: format!("Intro to {title}.\n\n== History ==\n{title} has a history."),
            pageid: 1,
        })
    }
}
