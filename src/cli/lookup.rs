//! Lookup and tool-listing command handlers.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use quarry::cache::DiskCache;
use quarry::config::Config;
use quarry::tools::{ToolContext, ToolRegistry};

fn registry() -> ToolRegistry {
    let config = Config::load();
    let cache = Arc::new(DiskCache::from_config(&config.cache));
    ToolRegistry::new(&config, cache)
}

/// Run one tool through the registry and print its LLM-facing output.
pub(crate) async fn cmd_lookup(tool: String, query: String, fresh: bool) -> Result<()> {
    let registry = registry();
    let Some(tool) = registry.get(&tool) else {
        anyhow::bail!(
            "Unknown tool '{}'. Available: {}",
            tool,
            registry.names().join(", ")
        );
    };

    // web_fetch takes a URL argument; everything else takes a query.
    let args = if tool.name() == "web_fetch" {
        json!({ "url": query })
    } else {
        json!({ "query": query })
    };
    let ctx = if fresh {
        ToolContext::fresh()
    } else {
        ToolContext::new()
    };

    let output = tool.execute(args, &ctx).await?;
    println!("{}", output.for_llm);
    Ok(())
}

/// List registered tools with their compact descriptions.
pub(crate) async fn cmd_tools() -> Result<()> {
    let registry = registry();
    println!("Tools:");
    for tool in registry.list() {
        println!("  - {} — {}", tool.name(), tool.compact_description());
    }
    Ok(())
}
