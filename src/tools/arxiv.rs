//! Academic paper search via the arXiv Atom export API.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value};

use crate::cache::DiskCache;
use crate::error::{QuarryError, Result};
use crate::utils::text::clip_chars;

use super::{cached_text, require_query, Tool, ToolCategory, ToolContext, ToolOutput};

const API_BASE: &str = "https://export.arxiv.org/api/query";

/// Maximum characters of abstract kept per paper.
const MAX_SUMMARY_CHARS: usize = 600;

/// One `<entry>` from the Atom feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArxivEntry {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: String,
    /// The `abs` page URL (the Atom `<id>`).
    pub link: String,
}

/// Academic paper search tool backed by arXiv.
pub struct ArxivTool {
    client: reqwest::Client,
    cache: Arc<DiskCache>,
    max_results: usize,
}

impl ArxivTool {
    pub fn new(client: reqwest::Client, cache: Arc<DiskCache>, max_results: usize) -> Self {
        Self {
            client,
            cache,
            max_results,
        }
    }
}

/// Fields captured while walking an `<entry>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryField {
    Title,
    Summary,
    Published,
    Id,
    AuthorName,
}

/// Parse the Atom feed into entries. Feed-level `<title>`/`<id>` elements
/// are ignored; only text inside `<entry>` is collected.
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<ArxivEntry> = None;
    let mut field: Option<EntryField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"entry" => current = Some(ArxivEntry::default()),
                    b"title" if current.is_some() => field = Some(EntryField::Title),
                    b"summary" if current.is_some() => field = Some(EntryField::Summary),
                    b"published" if current.is_some() => field = Some(EntryField::Published),
                    b"id" if current.is_some() => field = Some(EntryField::Id),
                    b"name" if current.is_some() => {
                        field = Some(EntryField::AuthorName);
                        if let Some(entry) = current.as_mut() {
                            entry.authors.push(String::new());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let Some(entry) = current.as_mut() else {
                    buf.clear();
                    continue;
                };
                let text = e
                    .unescape()
                    .map_err(|e| QuarryError::Parse(format!("XML unescape error: {e}")))?;
                match field {
                    Some(EntryField::Title) => entry.title.push_str(&text),
                    Some(EntryField::Summary) => entry.summary.push_str(&text),
                    Some(EntryField::Published) => entry.published.push_str(&text),
                    Some(EntryField::Id) => entry.link.push_str(&text),
                    Some(EntryField::AuthorName) => {
                        if let Some(author) = entry.authors.last_mut() {
                            author.push_str(&text);
                        }
                    }
                    None => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"entry" {
                    if let Some(mut entry) = current.take() {
                        entry.title = collapse_whitespace(&entry.title);
                        entry.summary = collapse_whitespace(&entry.summary);
                        entries.push(entry);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QuarryError::Parse(format!("arXiv feed parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Atom text blocks wrap mid-sentence; collapse runs of whitespace.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render entries as numbered title/authors/date/abstract/link blocks.
fn format_entries(query: &str, entries: &[ArxivEntry], max_results: usize) -> String {
    if entries.is_empty() {
        return format!("No arXiv results for '{query}'");
    }
    let mut out = format!("arXiv results for '{query}':\n");
    for (i, entry) in entries.iter().take(max_results).enumerate() {
        let authors = if entry.authors.is_empty() {
            "unknown authors".to_string()
        } else {
            entry.authors.join(", ")
        };
        let date = entry.published.split('T').next().unwrap_or("undated");
        out.push_str(&format!(
            "\n{}. {}\n{} ({})\n{}\n{}\n",
            i + 1,
            entry.title,
            authors,
            date,
            clip_chars(&entry.summary, MAX_SUMMARY_CHARS),
            entry.link
        ));
    }
    out
}

#[async_trait]
impl Tool for ArxivTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Search arXiv for academic papers. Returns titles, authors, \
         publication dates, trimmed abstracts, and links to the abstract \
         pages. Best for recent research and preprints."
    }

    fn compact_description(&self) -> &str {
        "arXiv paper search"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Academic
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Topic, author, or keywords to search for"
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

        let max_results = self.max_results.max(1).to_string();
        let search_query = format!("all:{query}");
        let response = self
            .client
            .get(API_BASE)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(QuarryError::Tool(format!(
                "arXiv API returned {}",
                response.status()
            )));
        }

        let xml = response.text().await?;
        let entries = parse_feed(&xml)?;
        let text = format_entries(&query, &entries, self.max_results);
        self.cache.put(self.name(), &query, Value::String(text.clone()));
        Ok(ToolOutput::llm_only(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=all:transformers</title>
  <id>http://arxiv.org/api/abc123</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
 You Need</title>
    <summary>The dominant sequence transduction models are based on complex
 recurrent or convolutional neural networks.</summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2010.11929v2</id>
    <published>2020-10-22T17:55:59Z</published>
    <title>An Image is Worth 16x16 Words</title>
    <summary>Vision Transformer attains excellent results.</summary>
    <author><name>Alexey Dosovitskiy</name></author>
  </entry>
</feed>"#;

    #[test]
    fn feed_parses_entries_not_feed_header() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Attention Is All You Need");
        assert_eq!(entries[0].link, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(
            entries[0].authors,
            vec!["Ashish Vaswani", "Noam Shazeer"]
        );
        assert_eq!(entries[1].authors, vec!["Alexey Dosovitskiy"]);
    }

    #[test]
    fn wrapped_summary_lines_are_collapsed() {
        let entries = parse_feed(FEED).unwrap();
        assert!(entries[0]
            .summary
            .contains("complex recurrent or convolutional"));
        assert!(!entries[0].summary.contains('\n'));
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>q</title></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(parse_feed("<feed><entry>").is_err() || parse_feed("<feed><entry>").unwrap().is_empty());
    }

    #[test]
    fn formatting_includes_authors_date_and_link() {
        let entries = parse_feed(FEED).unwrap();
        let text = format_entries("transformers", &entries, 3);
        assert!(text.contains("1. Attention Is All You Need"));
        assert!(text.contains("Ashish Vaswani, Noam Shazeer (2017-06-12)"));
        assert!(text.contains("http://arxiv.org/abs/1706.03762v7"));
    }

    #[test]
    fn formatting_caps_results() {
        let entries = parse_feed(FEED).unwrap();
        let text = format_entries("transformers", &entries, 1);
        assert!(!text.contains("16x16"));
    }

    #[test]
    fn no_entries_message() {
        assert_eq!(format_entries("xyzzy", &[], 3), "No arXiv results for 'xyzzy'");
    }
}
