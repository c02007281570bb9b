use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wikiscribe_common::{Result, ScribeError};

use crate::source::KnowledgeSource;
use crate::types::{PageContent, PageSummary, SearchHit};

/// `{lang}` is replaced with the language code on every call.
pub const WIKIPEDIA_ENDPOINT: &str = "https://{lang}.wikipedia.org/w/api.php";

const USER_AGENT: &str = concat!("wikiscribe/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize, Default)]
struct QueryBody {
    #[serde(default)]
    search: Vec<RawSearchHit>,
    #[serde(default)]
    pages: HashMap<String, RawPage>,
}

#[derive(Deserialize)]
struct RawSearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    pageid: u64,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    pageid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    missing: Option<serde_json::Value>,
}

/// MediaWiki action API client.
pub struct WikipediaClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl WikipediaClient {
    pub fn new() -> Self {
        Self {
            endpoint: WIKIPEDIA_ENDPOINT.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScribeError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new().with_http_client(http_client))
    }

    /// Replace the endpoint template. Must contain `{lang}`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn endpoint_for(&self, language: &str) -> Result<String> {
        let valid = (2..=12).contains(&language.len())
            && language
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '-');
        if !valid {
            return Err(ScribeError::Knowledge(format!(
                "Invalid language code: '{language}'"
            )));
        }
        Ok(self.endpoint.replace("{lang}", language))
    }

    async fn query(&self, language: &str, params: &[(&str, &str)]) -> Result<QueryBody> {
        let url = self.endpoint_for(language)?;
        debug!(%url, ?params, "Querying Wikipedia");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("action", "query"), ("format", "json"), ("utf8", "1")])
            .query(params)
            .send()
            .await
            .map_err(|e| ScribeError::Knowledge(format!("Wikipedia request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScribeError::Knowledge(format!(
                "Wikipedia API returned {status}"
            )));
        }

        let parsed: ApiResponse = response.json().await.map_err(|e| {
            ScribeError::Knowledge(format!("Failed to parse Wikipedia response: {e}"))
        })?;

        if let Some(error) = parsed.error {
            return Err(ScribeError::Knowledge(format!(
                "Wikipedia API error ({}): {}",
                error.code, error.info
            )));
        }

        Ok(parsed.query.unwrap_or_default())
    }

    /// Single page lookup shared by summary and content.
    async fn page(&self, language: &str, title: &str, params: &[(&str, &str)]) -> Result<RawPage> {
        let mut all = vec![
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
        ];
        all.extend_from_slice(params);

        let body = self.query(language, &all).await?;
        let page = body
            .pages
            .into_values()
            .next()
            .ok_or_else(|| ScribeError::Knowledge(format!("No page found for '{title}'")))?;

        if page.missing.is_some() {
            return Err(ScribeError::Knowledge(format!(
                "Page '{title}' not found on {language}.wikipedia.org"
            )));
        }
        Ok(page)
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_search_markup(snippet: &str) -> String {
    snippet
        .replace("<span class=\"searchmatch\">", "")
        .replace("</span>", "")
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn search(&self, language: &str, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = limit.to_string();
        let body = self
            .query(
                language,
                &[("list", "search"), ("srsearch", query), ("srlimit", limit.as_str())],
            )
            .await?;

        Ok(body
            .search
            .into_iter()
            .map(|hit| SearchHit {
                snippet: strip_search_markup(&hit.snippet),
                title: hit.title,
                pageid: hit.pageid,
            })
            .collect())
    }

    async fn summary(&self, language: &str, title: &str) -> Result<PageSummary> {
        let page = self.page(language, title, &[("exintro", "1")]).await?;
        Ok(PageSummary {
            title: page.title,
            summary: page.extract,
            pageid: page.pageid,
        })
    }

    async fn content(&self, language: &str, title: &str) -> Result<PageContent> {
        let page = self
            .page(
                language,
                title,
                &[("exlimit", "1"), ("exsectionformat", "wiki")],
            )
            .await?;
        Ok(PageContent {
            title: page.title,
            content: page.extract,
            pageid: page.pageid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_searchmatch_spans() {
        let snippet = "The <span class=\"searchmatch\">Rust</span> language";
        assert_eq!(strip_search_markup(snippet), "The Rust language");
    }

    #[test]
    fn endpoint_substitutes_language() {
        let client = WikipediaClient::new();
        assert_eq!(
            client.endpoint_for("pt").unwrap(),
            "https://pt.wikipedia.org/w/api.php"
        );
        assert_eq!(
            client.endpoint_for("zh-yue").unwrap(),
            "https://zh-yue.wikipedia.org/w/api.php"
        );
    }

    #[test]
    fn rejects_language_codes_that_are_not_hostnames() {
        let client = WikipediaClient::new();
        assert!(client.endpoint_for("").is_err());
        assert!(client.endpoint_for("EN").is_err());
        assert!(client.endpoint_for("evil.com/").is_err());
    }
}
