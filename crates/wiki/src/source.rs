use async_trait::async_trait;
use wikiscribe_common::Result;

use crate::types::{PageContent, PageSummary, SearchHit};

/// Encyclopedia lookups used by the researcher. The language edition is
/// chosen per call so one source can serve every request.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn search(&self, language: &str, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    async fn summary(&self, language: &str, title: &str) -> Result<PageSummary>;

    async fn content(&self, language: &str, title: &str) -> Result<PageContent>;
}
