//! General web search.
//!
//! Uses the Brave Search API when `BRAVE_API_KEY` is set, otherwise the
//! keyless DuckDuckGo Instant Answer API. Both providers are normalized
//! into the same title/url/snippet rows before formatting.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::cache::DiskCache;
use crate::error::{QuarryError, Result};
use crate::utils::text::clip_chars;

use super::{cached_text, require_query, Tool, ToolCategory, ToolContext, ToolOutput};

const BRAVE_API_BASE: &str = "https://api.search.brave.com/res/v1/web/search";
const DUCKDUCKGO_API_BASE: &str = "https://api.duckduckgo.com/";

/// Env var holding the optional Brave Search subscription token.
pub const BRAVE_KEY_VAR: &str = "BRAVE_API_KEY";

/// Maximum characters of snippet kept per row.
const MAX_SNIPPET_CHARS: usize = 400;

/// Which backend serves a search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Provider {
    Brave(String),
    DuckDuckGo,
}

/// Pick the provider from an env var reading: a non-blank Brave key selects
/// Brave, anything else falls back to the keyless DuckDuckGo API.
fn select_provider(env_value: Option<String>) -> Provider {
    match env_value.map(|k| k.trim().to_string()) {
        Some(key) if !key.is_empty() => Provider::Brave(key),
        _ => Provider::DuckDuckGo,
    }
}

/// A provider-neutral search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search tool with provider fallback.
pub struct WebSearchTool {
    client: reqwest::Client,
    cache: Arc<DiskCache>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(client: reqwest::Client, cache: Arc<DiskCache>, max_results: usize) -> Self {
        Self {
            client,
            cache,
            max_results,
        }
    }

    async fn search_brave(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>> {
        let count = self.max_results.max(1).to_string();
        let response = self
            .client
            .get(BRAVE_API_BASE)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(QuarryError::Tool(format!(
                "Brave Search returned {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        Ok(parse_brave(&body))
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(DUCKDUCKGO_API_BASE)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(QuarryError::Tool(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        Ok(parse_duckduckgo(&body))
    }
}

/// Normalize a Brave `/web/results` payload.
fn parse_brave(body: &Value) -> Vec<SearchResult> {
    let Some(rows) = body.pointer("/web/results").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let title = row.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let url = row.get("url").and_then(|v| v.as_str()).unwrap_or("");
            let snippet = row
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if title.is_empty() && url.is_empty() {
                return None;
            }
            Some(SearchResult {
                title: title.to_string(),
                url: url.to_string(),
                snippet: snippet.to_string(),
            })
        })
        .collect()
}

/// Normalize a DuckDuckGo Instant Answer payload: the abstract first, then
/// related topics (flattening one level of grouped topics).
fn parse_duckduckgo(body: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = body
        .get("AbstractText")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if !abstract_text.is_empty() {
        results.push(SearchResult {
            title: body
                .get("Heading")
                .and_then(|v| v.as_str())
                .unwrap_or("Summary")
                .to_string(),
            url: body
                .get("AbstractURL")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    fn push_topic(topic: &Value, results: &mut Vec<SearchResult>) {
        let text = topic.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        let url = topic.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() {
            return;
        }
        // Instant answers carry no separate title; the first clause works.
        let title = text.split(" - ").next().unwrap_or(text).to_string();
        results.push(SearchResult {
            title,
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }

    if let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
        for topic in topics {
            if let Some(nested) = topic.get("Topics").and_then(|v| v.as_array()) {
                for inner in nested {
                    push_topic(inner, &mut results);
                }
            } else {
                push_topic(topic, &mut results);
            }
        }
    }

    results
}

/// Render rows as numbered title/snippet/url blocks.
fn format_results(query: &str, results: &[SearchResult], max_results: usize) -> String {
    if results.is_empty() {
        return format!("No web search results for '{query}'");
    }
    let mut out = format!("Web search results for '{query}':\n");
    for (i, row) in results.iter().take(max_results).enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n{}\n{}\n",
            i + 1,
            row.title,
            clip_chars(&row.snippet, MAX_SNIPPET_CHARS),
            row.url
        ));
    }
    out
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns titles, snippets, \
         and URLs for the top results. Uses Brave Search when BRAVE_API_KEY \
         is configured, falling back to DuckDuckGo instant answers."
    }

    fn compact_description(&self) -> &str {
        "Web search"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Search
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let query = require_query(&args)?;
        if let Some(text) = cached_text(&self.cache, ctx, self.name(), &query) {
            return Ok(ToolOutput::llm_only(text));
        }

        let results = match select_provider(std::env::var(BRAVE_KEY_VAR).ok()) {
            Provider::Brave(key) => self.search_brave(&query, &key).await?,
            Provider::DuckDuckGo => self.search_duckduckgo(&query).await?,
        };

        let text = format_results(&query, &results, self.max_results);
        self.cache.put(self.name(), &query, Value::String(text.clone()));
        Ok(ToolOutput::llm_only(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brave_rows_normalize() {
        let body = json!({
            "web": {
                "results": [
                    {"title": "Rust Programming Language", "url": "https://rust-lang.org", "description": "A language empowering everyone."},
                    {"title": "Rust Forum", "url": "https://users.rust-lang.org", "description": "Community forum."}
                ]
            }
        });
        let results = parse_brave(&body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://rust-lang.org");
    }

    #[test]
    fn brave_missing_block_is_empty() {
        assert!(parse_brave(&json!({"query": {}})).is_empty());
    }

    #[test]
    fn duckduckgo_abstract_comes_first() {
        let body = json!({
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a systems programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "RelatedTopics": [
                {"Text": "Cargo - The Rust package manager", "FirstURL": "https://doc.rust-lang.org/cargo"}
            ]
        });
        let results = parse_duckduckgo(&body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust (programming language)");
        assert_eq!(results[0].snippet, "Rust is a systems programming language.");
        assert_eq!(results[1].title, "Cargo");
    }

    #[test]
    fn duckduckgo_flattens_grouped_topics() {
        let body = json!({
            "AbstractText": "",
            "RelatedTopics": [
                {"Topics": [
                    {"Text": "Alpha - first", "FirstURL": "https://a.example"},
                    {"Text": "Beta - second", "FirstURL": "https://b.example"}
                ]},
                {"Text": "Gamma - third", "FirstURL": "https://c.example"}
            ]
        });
        let results = parse_duckduckgo(&body);
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn formatting_caps_and_numbers_rows() {
        let rows: Vec<SearchResult> = (0..10)
            .map(|i| SearchResult {
                title: format!("Result {i}"),
                url: format!("https://example.com/{i}"),
                snippet: format!("Snippet {i}"),
            })
            .collect();
        let text = format_results("rust", &rows, 3);
        assert!(text.contains("1. Result 0"));
        assert!(text.contains("3. Result 2"));
        assert!(!text.contains("Result 3"));
    }

    #[test]
    fn no_results_message() {
        assert_eq!(
            format_results("xyzzy", &[], 5),
            "No web search results for 'xyzzy'"
        );
    }

    #[test]
    fn missing_or_blank_brave_key_falls_back_to_duckduckgo() {
        assert_eq!(select_provider(None), Provider::DuckDuckGo);
        assert_eq!(select_provider(Some(String::new())), Provider::DuckDuckGo);
        assert_eq!(
            select_provider(Some("   ".to_string())),
            Provider::DuckDuckGo
        );
    }

    #[test]
    fn brave_key_is_trimmed_and_selected() {
        assert_eq!(
            select_provider(Some(" tok-123 ".to_string())),
            Provider::Brave("tok-123".to_string())
        );
    }
}
