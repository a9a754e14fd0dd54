//! News search via the NewsAPI `everything` endpoint.
//!
//! Requires a `NEWSAPI_KEY`; there is no keyless fallback for news, so a
//! missing key is a clear error rather than a degraded result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::DiskCache;
use crate::error::{QuarryError, Result};
use crate::utils::text::clip_chars;

use super::{cached_text, require_query, Tool, ToolCategory, ToolContext, ToolOutput};

const API_BASE: &str = "https://newsapi.org/v2/everything";

/// Env var holding the NewsAPI key.
pub const NEWSAPI_KEY_VAR: &str = "NEWSAPI_KEY";

/// Maximum characters of description kept per article.
const MAX_DESCRIPTION_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

/// One article row from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// News search tool backed by NewsAPI.
pub struct NewsSearchTool {
    client: reqwest::Client,
    cache: Arc<DiskCache>,
    max_results: usize,
}

impl NewsSearchTool {
    pub fn new(client: reqwest::Client, cache: Arc<DiskCache>, max_results: usize) -> Self {
        Self {
            client,
            cache,
            max_results,
        }
    }
}

/// Resolve the API key from an env var reading. Blank values count as
/// missing; the error names the variable the user has to set.
fn resolve_api_key(env_value: Option<String>) -> Result<String> {
    env_value
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            QuarryError::Tool(format!(
                "News search requires the {NEWSAPI_KEY_VAR} environment variable"
            ))
        })
}

/// Parse the response body, surfacing API-level errors (`status != "ok"`).
fn parse_articles(body: &Value) -> Result<Vec<Article>> {
    let response: NewsResponse = serde_json::from_value(body.clone())?;
    if response.status != "ok" {
        return Err(QuarryError::Tool(format!(
            "NewsAPI error: {}",
            response.message.unwrap_or_else(|| response.status.clone())
        )));
    }
    Ok(response.articles)
}

/// Render articles as numbered title/source/date/description/url blocks.
fn format_articles(query: &str, articles: &[Article], max_results: usize) -> String {
    if articles.is_empty() {
        return format!("No news results for '{query}'");
    }
    let mut out = format!("News results for '{query}':\n");
    for (i, article) in articles.iter().take(max_results).enumerate() {
        let source = article.source.name.as_deref().unwrap_or("unknown source");
        let date = article
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        let description = article
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| clip_chars(d, MAX_DESCRIPTION_CHARS))
            .unwrap_or_else(|| "(no description)".to_string());
        out.push_str(&format!(
            "\n{}. {} ({}, {})\n{}\n{}\n",
            i + 1,
            article.title,
            source,
            date,
            description,
            article.url
        ));
    }
    out
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn name(&self) -> &str {
        "news_search"
    }

    fn description(&self) -> &str {
        "Search recent news coverage. Returns article titles with source, \
         publication date, description, and URL, newest first. Requires the \
         NEWSAPI_KEY environment variable."
    }

    fn compact_description(&self) -> &str {
        "News search"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::News
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "News topic to search for"
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

        let api_key = resolve_api_key(std::env::var(NEWSAPI_KEY_VAR).ok())?;

        let page_size = self.max_results.max(1).to_string();
        let response = self
            .client
            .get(API_BASE)
            .header("X-Api-Key", api_key.as_str())
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
            ])
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            QuarryError::Tool(format!("NewsAPI returned {status} with unreadable body: {e}"))
        })?;

        let articles = parse_articles(&body)?;
        let text = format_articles(&query, &articles, self.max_results);
        self.cache.put(self.name(), &query, Value::String(text.clone()));
        Ok(ToolOutput::llm_only(text))
    }
}
