//! Values returned by a knowledge source.

use serde::{Deserialize, Serialize};

use crate::sections::split_sections;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    /// Plain-text snippet with search-match markup removed
    pub snippet: String,
    pub pageid: u64,
}

/// Intro paragraph(s) of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub title: String,
    pub summary: String,
    pub pageid: u64,
}

/// Full plain-text extract of a page, headings kept in wiki format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub content: String,
    pub pageid: u64,
}

impl PageContent {
    /// Split the extract on `== Heading ==` lines.
    pub fn sections(&self) -> Vec<WikiSection> {
        split_sections(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSection {
    pub title: String,
    pub content: String,
}
