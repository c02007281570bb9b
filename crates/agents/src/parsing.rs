//! JSON extraction from free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wikiscribe_common::{Result, ScribeError};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json(.*?)```").expect("valid regex"));

/// Pull a JSON value out of model text.
///
/// Tried in order: the whole text, the first ```` ```json ```` fenced block,
/// then the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(captures) = FENCED_JSON.captures(trimmed) {
        let block = captures.get(1).map_or("", |m| m.as_str());
        return serde_json::from_str(block.trim())
            .map_err(|e| ScribeError::Parse(format!("Invalid JSON in fenced block: {e}")));
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
    {
        return serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| ScribeError::Parse(format!("Invalid JSON object in model output: {e}")));
    }

    Err(ScribeError::Parse(
        "Could not extract JSON from model output".to_string(),
    ))
}

/// [`extract_json`] followed by deserialization into `T`.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = extract_json(text)?;
    serde_json::from_value(value)
        .map_err(|e| ScribeError::Parse(format!("Unexpected JSON shape: {e}")))
}
