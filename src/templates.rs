//! Canned multi-step research templates.
//!
//! Each template carries a set of `{topic}`-parameterized queries, the focus
//! areas those queries are meant to cover, and the lookup tools best suited
//! to answering them. Built-ins cover six research domains; users can add or
//! override templates by dropping JSON files into `~/.quarry/templates/`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A research template with predefined queries and guidance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchTemplate {
    pub name: String,
    pub description: String,
    /// Queries containing a `{topic}` placeholder.
    pub queries: Vec<String>,
    pub focus_areas: Vec<String>,
    pub suggested_tools: Vec<String>,
}

/// Detailed template info as rendered for callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub focus_areas: Vec<String>,
    pub suggested_tools: Vec<String>,
    /// First three queries, as a taste of the template.
    pub sample_queries: Vec<String>,
}

/// Registry of built-in and user templates, keyed by slug.
pub struct TemplateRegistry {
    templates: HashMap<String, ResearchTemplate>,
    builtin_slugs: Vec<String>,
}

impl TemplateRegistry {
    /// Registry holding only the built-in templates.
    pub fn new() -> Self {
        let templates = builtin_templates();
        let mut builtin_slugs: Vec<String> = templates.keys().cloned().collect();
        builtin_slugs.sort();
        Self {
            templates,
            builtin_slugs,
        }
    }

    /// Built-ins plus user templates from `dir` (`*.json`, one template per
    /// file, file stem is the slug). A user file with a built-in's slug
    /// overrides it; unreadable files are logged and skipped.
    pub fn with_user_dir(dir: &Path) -> Self {
        let mut registry = Self::new();
        let Ok(reader) = std::fs::read_dir(dir) else {
            return registry;
        };
        for entry in reader.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()))
            {
                Ok(template) => {
                    registry.templates.insert(slug.to_lowercase(), template);
                }
                Err(e) => {
                    warn!(path = %path.display(), "Skipping unreadable template file: {}", e);
                }
            }
        }
        registry
    }

    /// Case-insensitive lookup by slug.
    pub fn get(&self, slug: &str) -> Option<&ResearchTemplate> {
        self.templates.get(&slug.to_lowercase())
    }

    /// `(slug, description)` pairs, sorted by slug.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .templates
            .iter()
            .map(|(slug, t)| (slug.clone(), t.description.clone()))
            .collect();
        out.sort();
        out
    }

    /// Slugs of the built-in templates.
    pub fn builtin_slugs(&self) -> &[String] {
        &self.builtin_slugs
    }

    /// Substitute `topic` into each of the template's queries. Unknown
    /// slugs yield an empty list.
    pub fn queries_for(&self, slug: &str, topic: &str) -> Vec<String> {
        match self.get(slug) {
            Some(template) => template
                .queries
                .iter()
                .map(|q| q.replace("{topic}", topic))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Detailed info for one template.
    pub fn info(&self, slug: &str) -> Option<TemplateInfo> {
        self.get(slug).map(|t| TemplateInfo {
            name: t.name.clone(),
            description: t.description.clone(),
            focus_areas: t.focus_areas.clone(),
            suggested_tools: t.suggested_tools.clone(),
            sample_queries: t.queries.iter().take(3).cloned().collect(),
        })
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn template(
    name: &str,
    description: &str,
    queries: &[&str],
    focus_areas: &[&str],
    suggested_tools: &[&str],
) -> ResearchTemplate {
    ResearchTemplate {
        name: name.to_string(),
        description: description.to_string(),
        queries: queries.iter().map(|s| s.to_string()).collect(),
        focus_areas: focus_areas.iter().map(|s| s.to_string()).collect(),
        suggested_tools: suggested_tools.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_templates() -> HashMap<String, ResearchTemplate> {
    let mut templates = HashMap::new();

    templates.insert(
        "technology".to_string(),
        template(
            "Technology Research",
            "Comprehensive research on technology topics, trends, and innovations",
            &[
                "What is {topic} and how does it work?",
                "What are the latest developments in {topic}?",
                "What are the advantages and disadvantages of {topic}?",
                "What are the current applications of {topic} in industry?",
                "What is the future outlook for {topic}?",
            ],
            &[
                "Technical definition and explanation",
                "Current market trends and adoption",
                "Benefits and limitations",
                "Real-world applications",
                "Future predictions and developments",
            ],
            &["wikipedia", "web_search", "news_search", "arxiv_search"],
        ),
    );

    templates.insert(
        "business".to_string(),
        template(
            "Business Analysis",
            "Research framework for business topics, companies, and market analysis",
            &[
                "What is the current state of {topic} in the market?",
                "Who are the key players in {topic}?",
                "What are the recent trends and developments in {topic}?",
                "What challenges and opportunities exist in {topic}?",
                "What is the financial outlook for {topic}?",
            ],
            &[
                "Market overview and size",
                "Key competitors and market leaders",
                "Recent trends and news",
                "Challenges and opportunities",
                "Financial performance and outlook",
            ],
            &["web_search", "news_search", "wikipedia"],
        ),
    );

    templates.insert(
        "academic".to_string(),
        template(
            "Academic Research",
            "Scholarly research approach for academic topics and literature review",
            &[
                "What does current research say about {topic}?",
                "What are the key theories and concepts related to {topic}?",
                "What are recent academic findings about {topic}?",
                "What methodologies are used to study {topic}?",
                "What are the current debates and controversies around {topic}?",
            ],
            &[
                "Literature review and key studies",
                "Theoretical frameworks",
                "Recent research findings",
                "Research methodologies",
                "Academic debates and discussions",
            ],
            &["arxiv_search", "wikipedia", "web_search"],
        ),
    );

    templates.insert(
        "health".to_string(),
        template(
            "Health & Medicine",
            "Research framework for health, medical, and wellness topics",
            &[
                "What is {topic} and what causes it?",
                "What are the symptoms and diagnosis methods for {topic}?",
                "What are the current treatment options for {topic}?",
                "What does recent medical research say about {topic}?",
                "What are the prevention strategies for {topic}?",
            ],
            &[
                "Medical definition and causes",
                "Symptoms and diagnostic criteria",
                "Treatment options and effectiveness",
                "Latest medical research",
                "Prevention and risk factors",
            ],
            &["wikipedia", "arxiv_search", "web_search", "news_search"],
        ),
    );

    templates.insert(
        "historical".to_string(),
        template(
            "Historical Research",
            "Research framework for historical events, periods, and figures",
            &[
                "What happened during {topic} and when?",
                "What were the causes and context of {topic}?",
                "Who were the key figures involved in {topic}?",
                "What were the consequences and impact of {topic}?",
                "How is {topic} viewed by modern historians?",
            ],
            &[
                "Timeline and key events",
                "Historical context and causes",
                "Important figures and their roles",
                "Immediate and long-term consequences",
                "Modern historical interpretation",
            ],
            &["wikipedia", "web_search"],
        ),
    );

    templates.insert(
        "comparative".to_string(),
        template(
            "Comparative Analysis",
            "Framework for comparing two or more topics, concepts, or entities",
            &[
                "What are the key differences between {topic}?",
                "What are the similarities between {topic}?",
                "What are the advantages and disadvantages of each in {topic}?",
                "In what situations is each better suited in {topic}?",
                "What do experts recommend regarding {topic}?",
            ],
            &[
                "Key differences and distinctions",
                "Common features and similarities",
                "Pros and cons of each option",
                "Use cases and applications",
                "Expert opinions and recommendations",
            ],
            &["wikipedia", "web_search", "news_search"],
        ),
    );

    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn six_builtins_present() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.list().len(), 6);
        for slug in [
            "technology",
            "business",
            "academic",
            "health",
            "historical",
            "comparative",
        ] {
            assert!(registry.get(slug).is_some(), "missing builtin '{slug}'");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = TemplateRegistry::new();
        assert_eq!(
            registry.get("Technology").map(|t| t.name.as_str()),
            Some("Technology Research")
        );
    }

    #[test]
    fn queries_substitute_topic() {
        let registry = TemplateRegistry::new();
        let queries = registry.queries_for("technology", "quantum computing");
        assert_eq!(queries.len(), 5);
        assert_eq!(
            queries[0],
            "What is quantum computing and how does it work?"
        );
        assert!(queries.iter().all(|q| !q.contains("{topic}")));
    }

    #[test]
    fn unknown_slug_yields_empty_queries() {
        let registry = TemplateRegistry::new();
        assert!(registry.queries_for("culinary", "ramen").is_empty());
        assert!(registry.info("culinary").is_none());
    }

    #[test]
    fn queryless_template_is_still_resolvable() {
        // A user template with no queries must stay distinguishable from an
        // unknown slug: `get` resolves it, `queries_for` is just empty.
        let tmp = TempDir::new().unwrap();
        let bare = ResearchTemplate {
            name: "Bookmarks".to_string(),
            description: "Reading list, no canned queries".to_string(),
            queries: vec![],
            focus_areas: vec![],
            suggested_tools: vec!["web_fetch".to_string()],
        };
        std::fs::write(
            tmp.path().join("bookmarks.json"),
            serde_json::to_string(&bare).unwrap(),
        )
        .unwrap();
        let registry = TemplateRegistry::with_user_dir(tmp.path());
        assert!(registry.get("bookmarks").is_some());
        assert!(registry.queries_for("bookmarks", "anything").is_empty());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn info_caps_sample_queries_at_three() {
        let registry = TemplateRegistry::new();
        let info = registry.info("health").unwrap();
        assert_eq!(info.sample_queries.len(), 3);
        assert_eq!(info.name, "Health & Medicine");
        assert!(!info.focus_areas.is_empty());
    }

    #[test]
    fn suggested_tools_name_registered_tools() {
        // Every tool a builtin suggests must exist in the tool registry,
        // otherwise the agent loop would be steered at a dead name.
        let known = ["wikipedia", "web_search", "news_search", "arxiv_search", "web_fetch"];
        let registry = TemplateRegistry::new();
        for (slug, _) in registry.list() {
            for tool in &registry.get(&slug).unwrap().suggested_tools {
                assert!(known.contains(&tool.as_str()), "{slug} suggests unknown tool {tool}");
            }
        }
    }

    #[test]
    fn user_template_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        let custom = ResearchTemplate {
            name: "My Tech".to_string(),
            description: "Custom".to_string(),
            queries: vec!["Tell me about {topic}".to_string()],
            focus_areas: vec![],
            suggested_tools: vec!["web_search".to_string()],
        };
        std::fs::write(
            tmp.path().join("technology.json"),
            serde_json::to_string(&custom).unwrap(),
        )
        .unwrap();
        let registry = TemplateRegistry::with_user_dir(tmp.path());
        assert_eq!(registry.get("technology").unwrap().name, "My Tech");
        // Other builtins untouched.
        assert_eq!(registry.list().len(), 6);
    }

    #[test]
    fn user_dir_adds_new_slug_and_skips_bad_files() {
        let tmp = TempDir::new().unwrap();
        let custom = ResearchTemplate {
            name: "Legal Research".to_string(),
            description: "Case law".to_string(),
            queries: vec!["What precedents govern {topic}?".to_string()],
            focus_areas: vec!["Precedent".to_string()],
            suggested_tools: vec!["web_search".to_string()],
        };
        std::fs::write(
            tmp.path().join("legal.json"),
            serde_json::to_string(&custom).unwrap(),
        )
        .unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{oops").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let registry = TemplateRegistry::with_user_dir(tmp.path());
        assert!(registry.get("legal").is_some());
        assert!(registry.get("broken").is_none());
        assert_eq!(registry.list().len(), 7);
    }

    #[test]
    fn missing_user_dir_falls_back_to_builtins() {
        let registry = TemplateRegistry::with_user_dir(Path::new("/nonexistent/templates"));
        assert_eq!(registry.list().len(), 6);
    }
}
