//! Encyclopedia lookup via the MediaWiki API.
//!
//! One `generator=search` call returns matching pages together with their
//! plaintext intro extracts, so a lookup costs a single request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::DiskCache;
use crate::error::{QuarryError, Result};
use crate::utils::text::clip_chars;

use super::{cached_text, require_query, Tool, ToolCategory, ToolContext, ToolOutput};

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";

/// Maximum characters of extract kept per page.
const MAX_EXTRACT_CHARS: usize = 800;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

/// One page from a `generator=search` response.
#[derive(Debug, Clone, Deserialize)]
pub struct WikiPage {
    pub pageid: u64,
    pub title: String,
    #[serde(default)]
    pub extract: String,
    /// Search rank within the result set.
    #[serde(default)]
    pub index: u32,
}

/// Encyclopedia lookup tool backed by the English Wikipedia.
pub struct WikipediaTool {
    client: reqwest::Client,
    cache: Arc<DiskCache>,
    max_results: usize,
}

impl WikipediaTool {
    pub fn new(client: reqwest::Client, cache: Arc<DiskCache>, max_results: usize) -> Self {
        Self {
            client,
            cache,
            max_results,
        }
    }
}

/// Pull pages out of the API response, ordered by search rank.
fn parse_pages(body: &Value) -> Result<Vec<WikiPage>> {
    let response: QueryResponse = serde_json::from_value(body.clone())?;
    let mut pages: Vec<WikiPage> = response
        .query
        .map(|q| q.pages.into_values().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p.index);
    Ok(pages)
}

/// Render pages as numbered title/extract/link blocks.
fn format_pages(query: &str, pages: &[WikiPage], max_results: usize) -> String {
    if pages.is_empty() {
        return format!("No Wikipedia results for '{query}'");
    }
    let mut out = format!("Wikipedia results for '{query}':\n");
    for (i, page) in pages.iter().take(max_results).enumerate() {
        let extract = if page.extract.is_empty() {
            "(no extract available)".to_string()
        } else {
            clip_chars(page.extract.trim(), MAX_EXTRACT_CHARS)
        };
        out.push_str(&format!(
            "\n{}. {}\n{}\nhttps://en.wikipedia.org/?curid={}\n",
            i + 1,
            page.title,
            extract,
            page.pageid
        ));
    }
    out
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up encyclopedia articles on Wikipedia. Returns the top matching \
         page titles with their introductory extracts and links. Best for \
         definitions, background, and established facts."
    }

    fn compact_description(&self) -> &str {
        "Wikipedia lookup"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Reference
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Topic or phrase to look up"
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

        let limit = self.max_results.max(1).to_string();
        let response = self
            .client
            .get(API_BASE)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query.as_str()),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(QuarryError::Tool(format!(
                "Wikipedia API returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let pages = parse_pages(&body)?;
        let text = format_pages(&query, &pages, self.max_results);
        self.cache.put(self.name(), &query, Value::String(text.clone()));
        Ok(ToolOutput::llm_only(text))
    }
}
