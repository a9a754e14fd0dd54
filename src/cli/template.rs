//! Template command handler.

use anyhow::Result;

use quarry::config::Config;
use quarry::templates::TemplateRegistry;

use super::TemplateAction;

/// Inspect and generate research templates.
pub(crate) async fn cmd_template(action: TemplateAction) -> Result<()> {
    let registry = TemplateRegistry::with_user_dir(&Config::templates_dir());

    match action {
        TemplateAction::List => {
            let builtin = TemplateRegistry::new()
                .builtin_slugs()
                .iter()
                .cloned()
                .collect::<std::collections::HashSet<_>>();

            let templates = registry.list();
            if templates.is_empty() {
                println!("No templates available.");
                return Ok(());
            }

            println!("Templates:");
            for (slug, description) in templates {
                let origin = if builtin.contains(&slug) {
                    "built-in"
                } else {
                    "user"
                };
                println!("  - {} ({}) — {}", slug, origin, description);
            }
        }
        TemplateAction::Show { slug } => {
            let Some(info) = registry.info(&slug) else {
                anyhow::bail!("Template '{}' not found", slug);
            };

            println!("Name: {}", info.name);
            println!("Description: {}", info.description);
            println!("Suggested tools: {}", info.suggested_tools.join(", "));
            println!();
            println!("Focus areas:");
            for area in &info.focus_areas {
                println!("  - {}", area);
            }
            println!();
            println!("Sample queries:");
            for query in &info.sample_queries {
                println!("  - {}", query);
            }
        }
        TemplateAction::Queries { slug, topic } => {
            if registry.get(&slug).is_none() {
                anyhow::bail!("Template '{}' not found", slug);
            }
            let queries = registry.queries_for(&slug, &topic);
            if queries.is_empty() {
                println!("Template '{}' has no queries.", slug);
                return Ok(());
            }
            for query in queries {
                println!("{}", query);
            }
        }
    }

    Ok(())
}
