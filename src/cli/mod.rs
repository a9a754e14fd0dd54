//! Command-line front end.

mod cache;
mod config;
mod lookup;
mod template;

use clap::{Parser, Subcommand};

pub(crate) use cache::cmd_cache;
pub(crate) use config::cmd_config;
pub(crate) use lookup::{cmd_lookup, cmd_tools};
pub(crate) use template::cmd_template;

#[derive(Parser)]
#[command(name = "quarry", version, about = "Lightweight research-assistant toolkit")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one lookup tool and print its result
    Lookup {
        /// Tool name (see `quarry tools`)
        tool: String,
        /// Query string, or URL for web_fetch
        query: String,
        /// Bypass the cache read (the result is still cached)
        #[arg(long)]
        fresh: bool,
    },
    /// List the registered lookup tools
    Tools,
    /// Inspect and generate research templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Show and edit the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect and maintain the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum TemplateAction {
    /// List available templates
    List,
    /// Show one template in full
    Show { slug: String },
    /// Generate the template's queries for a topic
    Queries { slug: String, topic: String },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Print the config file path
    Path,
    /// Set one field by dotted key, e.g. `cache.ttl_hours 6`
    Set { key: String, value: String },
    /// Restore and persist the defaults
    Reset,
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Print cache statistics
    Stats,
    /// Delete every cached entry
    Clear,
    /// Delete expired and unreadable entries
    Cleanup,
}
