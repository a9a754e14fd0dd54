//! Quarry CLI entry point.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a .env next to the working directory.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Lookup { tool, query, fresh } => cli::cmd_lookup(tool, query, fresh).await,
        Command::Tools => cli::cmd_tools().await,
        Command::Template { action } => cli::cmd_template(action).await,
        Command::Config { action } => cli::cmd_config(action).await,
        Command::Cache { action } => cli::cmd_cache(action).await,
    }
}
