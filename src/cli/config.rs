//! Config command handler.

use anyhow::{Context, Result};

use quarry::config::Config;

use super::ConfigAction;

/// Show and edit the persisted configuration.
pub(crate) async fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(&key, &value)?;
            config.save().context("saving config")?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Reset => {
            let mut config = Config::load();
            config.reset().context("saving config")?;
            println!("Configuration reset to defaults.");
        }
    }
    Ok(())
}
