//! Uniform callable interface over the lookup services.
//!
//! Each wrapper is registered under a stable name and exposes a JSON-schema
//! parameter description, so an external LLM-driven agent loop can discover
//! and invoke them through one `Tool` trait. Wrappers consult the shared
//! disk cache before making their single outbound HTTP call and store the
//! formatted result afterwards.

pub mod arxiv;
pub mod news;
pub mod web_fetch;
pub mod web_search;
pub mod wikipedia;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::DiskCache;
use crate::config::Config;
use crate::error::{QuarryError, Result};

pub use arxiv::ArxivTool;
pub use news::NewsSearchTool;
pub use web_fetch::WebFetchTool;
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

/// User-Agent sent on every outbound lookup call.
pub(crate) const USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for lookup calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Broad grouping used when presenting tools to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    /// Encyclopedia-style reference lookups.
    Reference,
    /// General web search.
    Search,
    /// News and current events.
    News,
    /// Academic paper search.
    Academic,
    /// Raw page retrieval.
    Web,
}

/// Result of a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Text handed back to the LLM.
    pub for_llm: String,
}

impl ToolOutput {
    /// Output consisting only of LLM-facing text.
    pub fn llm_only(for_llm: impl Into<String>) -> Self {
        Self {
            for_llm: for_llm.into(),
        }
    }
}

/// Per-call execution context.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Skip the cache read (the result is still cached on the way out).
    pub fresh: bool,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that bypasses the cache read.
    pub fn fresh() -> Self {
        Self { fresh: true }
    }
}

/// A callable lookup-service wrapper.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name, as referenced by templates and the agent loop.
    fn name(&self) -> &str;

    /// Full description shown to the LLM.
    fn description(&self) -> &str;

    /// Short label for listings.
    fn compact_description(&self) -> &str;

    fn category(&self) -> ToolCategory;

    /// JSON schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// Run the lookup. One outbound HTTP call, no retries.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

/// Extract and validate the `query` string argument shared by the search
/// wrappers. Empty or missing queries are rejected before any HTTP call.
pub(crate) fn require_query(args: &Value) -> Result<String> {
    let query = args
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if query.is_empty() {
        return Err(QuarryError::Tool("'query' must be a non-empty string".to_string()));
    }
    Ok(query)
}

/// Shared HTTP client with the crate User-Agent and request timeout.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Read a cached formatted result for `(tool, query)` unless the context
/// asks for a fresh call. The query is normalized, as for search terms.
pub(crate) fn cached_text(
    cache: &DiskCache,
    ctx: &ToolContext,
    tool: &str,
    query: &str,
) -> Option<String> {
    if ctx.fresh {
        return None;
    }
    cache
        .get(tool, query)
        .and_then(|v| v.as_str().map(str::to_string))
}

/// Like [`cached_text`], but keyed exactly — for case-sensitive keys such
/// as URLs.
pub(crate) fn cached_text_exact(
    cache: &DiskCache,
    ctx: &ToolContext,
    tool: &str,
    key: &str,
) -> Option<String> {
    if ctx.fresh {
        return None;
    }
    cache
        .get_exact(tool, key)
        .and_then(|v| v.as_str().map(str::to_string))
}

/// Name-keyed collection of the registered tools.
///
/// # Example
///
/// Cached lookups are served without touching the network:
///
/// ```rust
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use quarry::cache::DiskCache;
/// use quarry::config::Config;
/// use quarry::tools::{ToolContext, ToolRegistry};
/// use serde_json::json;
///
/// let dir = std::env::temp_dir().join("quarry-doc-cache");
/// let cache = Arc::new(DiskCache::new(&dir, 3600, true));
/// cache.put("wikipedia", "ferrite", json!("Ferrite is a ceramic magnet."));
///
/// let registry = ToolRegistry::new(&Config::default(), cache);
/// let tool = registry.get("wikipedia").unwrap();
/// let out = tool
///     .execute(json!({"query": "ferrite"}), &ToolContext::new())
///     .await
///     .unwrap();
/// assert_eq!(out.for_llm, "Ferrite is a ceramic magnet.");
/// # });
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Build the standard registry: wikipedia, web_search, news_search,
    /// arxiv_search, and web_fetch, all sharing one HTTP client and the
    /// same disk cache.
    pub fn new(config: &Config, cache: Arc<DiskCache>) -> Self {
        let client = http_client();
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register(Arc::new(WikipediaTool::new(
            client.clone(),
            cache.clone(),
            config.search.max_wikipedia_results,
        )));
        registry.register(Arc::new(WebSearchTool::new(
            client.clone(),
            cache.clone(),
            config.search.max_web_results,
        )));
        registry.register(Arc::new(NewsSearchTool::new(
            client.clone(),
            cache.clone(),
            config.search.max_news_results,
        )));
        registry.register(Arc::new(ArxivTool::new(
            client.clone(),
            cache.clone(),
            config.search.max_arxiv_results,
        )));
        registry.register(Arc::new(WebFetchTool::new(client, cache)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools, sorted by name.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    pub fn names(&self) -> Vec<String> {
        self.list().iter().map(|t| t.name().to_string()).collect()
    }
}
