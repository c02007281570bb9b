//! Article model produced by the crew.

use crate::{Result, ScribeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_SECTIONS: usize = 2;
pub const MIN_SUMMARY_CHARS: usize = 100;
pub const MIN_SECTION_CHARS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl ArticleSection {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub keywords: Vec<String>,
    pub sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Article JSON as emitted by the writer and editor models.
///
/// Every field is optional on the wire; validation happens when the draft is
/// turned into an [`Article`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sections: Vec<ArticleSection>,
    #[serde(default)]
    pub metadata: DraftMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftMetadata {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A finished article. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub topic: String,
    pub language: String,
    pub title: String,
    pub summary: String,
    pub sections: Vec<ArticleSection>,
    pub metadata: ArticleMetadata,
    pub word_count: usize,
}

impl Article {
    /// Validate a draft and stamp it with topic, language and generation time.
    pub fn from_draft(
        draft: ArticleDraft,
        topic: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self> {
        validate_draft(&draft)?;

        let word_count = count_words(&draft.summary, &draft.sections);

        Ok(Self {
            topic: topic.into(),
            language: language.into(),
            title: draft.title,
            summary: draft.summary,
            sections: draft.sections,
            metadata: ArticleMetadata {
                keywords: draft.metadata.keywords,
                sources: draft.metadata.sources,
                generated_at: Utc::now(),
            },
            word_count,
        })
    }

    pub fn meets_min_words(&self, min_words: usize) -> bool {
        self.word_count >= min_words
    }
}

fn validate_draft(draft: &ArticleDraft) -> Result<()> {
    if draft.sections.len() < MIN_SECTIONS {
        return Err(ScribeError::Validation(format!(
            "article must have at least {MIN_SECTIONS} sections, got {}",
            draft.sections.len()
        )));
    }

    let summary_chars = draft.summary.chars().count();
    if summary_chars < MIN_SUMMARY_CHARS {
        return Err(ScribeError::Validation(format!(
            "summary must have at least {MIN_SUMMARY_CHARS} characters, got {summary_chars}"
        )));
    }

    for section in &draft.sections {
        let chars = section.content.chars().count();
        if chars < MIN_SECTION_CHARS {
            return Err(ScribeError::Validation(format!(
                "section '{}' must have at least {MIN_SECTION_CHARS} characters, got {chars}",
                section.title
            )));
        }
    }

    Ok(())
}

/// Words in the summary plus every section body.
pub fn count_words(summary: &str, sections: &[ArticleSection]) -> usize {
    summary.split_whitespace().count()
        + sections
            .iter()
            .map(|s| s.content.split_whitespace().count())
            .sum::<usize>()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const SUMMARY: &str = "Rust is a systems programming language focused on safety, speed and \
                           concurrency, without needing a garbage collector at runtime.";

    fn section(title: &str) -> ArticleSection {
        ArticleSection::new(
            title,
            "This section body is long enough to pass the fifty character minimum check.",
        )
    }

    fn draft() -> ArticleDraft {
        ArticleDraft {
            title: "Rust".into(),
            summary: SUMMARY.into(),
            sections: vec![section("History"), section("Design")],
            metadata: DraftMetadata {
                keywords: vec!["rust".into()],
                sources: vec!["Rust (programming language)".into()],
            },
        }
    }

    pub(crate) fn sample_article() -> Article {
        Article::from_draft(draft(), "Rust", "en").unwrap()
    }

    #[test]
    fn test_from_draft_counts_words() {
        let article = sample_article();
        let expected = SUMMARY.split_whitespace().count()
            + 2 * section("x").content.split_whitespace().count();
        assert_eq!(article.word_count, expected);
        assert_eq!(article.topic, "Rust");
        assert_eq!(article.language, "en");
        assert_eq!(article.metadata.keywords, vec!["rust".to_string()]);
    }

    #[test]
    fn test_meets_min_words() {
        let article = sample_article();
        assert!(article.meets_min_words(article.word_count));
        assert!(!article.meets_min_words(article.word_count + 1));
    }

    #[test]
    fn test_rejects_single_section() {
        let mut d = draft();
        d.sections.truncate(1);
        let err = Article::from_draft(d, "Rust", "en").unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
    }

    #[test]
    fn test_rejects_short_summary() {
        let mut d = draft();
        d.summary = "Too short.".into();
        assert!(Article::from_draft(d, "Rust", "en").is_err());
    }

    #[test]
    fn test_rejects_short_section() {
        let mut d = draft();
        d.sections[1].content = "tiny".into();
        let err = Article::from_draft(d, "Rust", "en").unwrap_err();
        assert!(err.to_string().contains("Design"));
    }

    #[test]
    fn test_draft_tolerates_missing_fields() {
        let d: ArticleDraft = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(d.title, "Only a title");
        assert!(d.sections.is_empty());
        assert!(d.metadata.keywords.is_empty());
    }

    #[test]
    fn test_draft_ignores_model_supplied_timestamp() {
        let json = r#"{
            "title": "T",
            "summary": "S",
            "sections": [],
            "metadata": {"keywords": ["k"], "sources": [], "generated_at": "whenever"}
        }"#;
        let d: ArticleDraft = serde_json::from_str(json).unwrap();
        assert_eq!(d.metadata.keywords, vec!["k".to_string()]);
    }
}
