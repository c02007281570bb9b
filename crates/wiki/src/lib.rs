//! Wikipedia lookups (search, intro summary, sectioned content).

pub mod client;
pub mod sections;
pub mod source;
pub mod types;

pub use client::{WIKIPEDIA_ENDPOINT, WikipediaClient};
pub use sections::{INTRO_SECTION_TITLE, split_sections};
pub use source::KnowledgeSource;
pub use types::{PageContent, PageSummary, SearchHit, WikiSection};
