//! Raw page fetch.
//!
//! Downloads a single URL. HTML bodies are reduced to readable text
//! (scripts and styles dropped, block elements newline-separated); other
//! content types pass through as-is. The only post-processing applied to
//! fetched content is truncation to a byte budget.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use url::Url;

use crate::cache::DiskCache;
use crate::error::{QuarryError, Result};
use crate::utils::text::{truncate_result, DEFAULT_MAX_RESULT_BYTES};

use super::{cached_text_exact, Tool, ToolCategory, ToolContext, ToolOutput};

/// Elements whose subtrees carry no readable text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "head", "svg", "template"];

/// Elements that end a visual block.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "br", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "section", "article",
];

/// Raw page fetch tool.
pub struct WebFetchTool {
    client: reqwest::Client,
    cache: Arc<DiskCache>,
    max_bytes: usize,
}

impl WebFetchTool {
    pub fn new(client: reqwest::Client, cache: Arc<DiskCache>) -> Self {
        Self {
            client,
            cache,
            max_bytes: DEFAULT_MAX_RESULT_BYTES,
        }
    }
}

/// Validate the `url` argument: parseable, http(s) scheme.
fn require_url(args: &Value) -> Result<Url> {
    let raw = args.get("url").and_then(|v| v.as_str()).unwrap_or("").trim();
    if raw.is_empty() {
        return Err(QuarryError::Tool("'url' must be a non-empty string".to_string()));
    }
    let url = Url::parse(raw).map_err(|e| QuarryError::Tool(format!("Invalid URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(QuarryError::Tool(format!(
            "Unsupported URL scheme '{}', only http and https are fetched",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Reduce an HTML document to `(title, readable text)`.
pub fn extract_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    // Collapse intra-line whitespace and drop blank lines.
    let text = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (title, text)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            collect_text(child_el, out);
            if BLOCK_ELEMENTS.contains(&name) {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Render the fetch result header plus the truncated body.
fn format_page(url: &Url, title: Option<&str>, body: &str, max_bytes: usize) -> String {
    let mut out = format!("Fetched {url}\n");
    if let Some(title) = title {
        out.push_str(&format!("Title: {title}\n"));
    }
    out.push('\n');
    out.push_str(&truncate_result(body, max_bytes));
    out
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a single web page by URL. HTML is reduced to readable text; \
         other content types are returned as-is. Large responses are \
         truncated."
    }

    fn compact_description(&self) -> &str {
        "Fetch a web page"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Web
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The http(s) URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let url = require_url(&args)?;
        // URLs are case-sensitive past the host, so the key is exact.
        let key = url.as_str().to_string();
        if let Some(text) = cached_text_exact(&self.cache, ctx, self.name(), &key) {
            return Ok(ToolOutput::llm_only(text));
        }

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;
        if !status.is_success() {
            let snippet = truncate_result(&body, 512);
            return Err(QuarryError::Tool(format!(
                "Fetch of {url} returned {status}: {snippet}"
            )));
        }

        let text = if content_type.contains("text/html") || looks_like_html(&body) {
            let (title, extracted) = extract_text(&body);
            format_page(&url, title.as_deref(), &extracted, self.max_bytes)
        } else {
            format_page(&url, None, &body, self.max_bytes)
        };

        self.cache
            .put_exact(self.name(), &key, Value::String(text.clone()));
        Ok(ToolOutput::llm_only(text))
    }
}

/// Cheap sniff for servers that omit the content type.
fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().get(..256).unwrap_or(body.trim_start());
    let lower = head.to_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Example Domain</title>
  <style>body { margin: 0; }</style>
  <script>console.log("tracking");</script>
</head>
<body>
  <h1>Example Domain</h1>
  <p>This domain is for use in <b>illustrative</b> examples.</p>
  <script>alert("more js");</script>
  <ul><li>First point</li><li>Second point</li></ul>
</body>
</html>"#;

    #[test]
    fn html_reduces_to_readable_text() {
        let (title, text) = extract_text(PAGE);
        assert_eq!(title.as_deref(), Some("Example Domain"));
        assert!(text.contains("This domain is for use in illustrative examples."));
        assert!(text.contains("First point"));
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let (_, text) = extract_text(PAGE);
        assert!(!text.contains("tracking"));
        assert!(!text.contains("margin"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn block_elements_separate_lines() {
        let (_, text) = extract_text(PAGE);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"Example Domain"));
        assert!(lines.contains(&"First point"));
        assert!(lines.contains(&"Second point"));
    }

    #[test]
    fn missing_title_is_none() {
        let (title, text) = extract_text("<html><body><p>bare</p></body></html>");
        assert!(title.is_none());
        assert_eq!(text, "bare");
    }

    #[test]
    fn url_validation() {
        assert!(require_url(&json!({})).is_err());
        assert!(require_url(&json!({"url": "notaurl"})).is_err());
        assert!(require_url(&json!({"url": "ftp://example.com/file"})).is_err());
        let url = require_url(&json!({"url": " https://example.com/page "})).unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn html_sniffing() {
        assert!(looks_like_html("  <!DOCTYPE html><html>"));
        assert!(looks_like_html("<html lang=\"en\">"));
        assert!(!looks_like_html("{\"json\": true}"));
    }

    #[test]
    fn formatted_page_truncates_body() {
        let url = Url::parse("https://example.com").unwrap();
        let body = "x".repeat(1000);
        let text = format_page(&url, Some("Big"), &body, 100);
        assert!(text.starts_with("Fetched https://example.com/\nTitle: Big\n"));
        assert!(text.contains("[truncated"));
    }
}
