//! User-tunable configuration, persisted as JSON under `~/.quarry`.
//!
//! Every field carries a serde default so partial config files load cleanly.
//! A corrupt file logs a warning and falls back to defaults rather than
//! aborting — the toolkit should stay usable with a damaged config.

pub mod watcher;

pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{QuarryError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub ui: UiConfig,
    pub cache: CacheConfig,
}

/// Settings forwarded to the external agent loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "claude-3-5-sonnet-20240620".to_string(),
            temperature: 0.1,
            max_tokens: None,
        }
    }
}

/// Per-service result caps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub max_web_results: usize,
    pub max_wikipedia_results: usize,
    pub max_arxiv_results: usize,
    pub max_news_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_web_results: 8,
            max_wikipedia_results: 3,
            max_arxiv_results: 3,
            max_news_results: 5,
        }
    }
}

/// Output shaping and persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub auto_save: bool,
    /// One of `json`, `txt`, `all`.
    pub default_format: String,
    pub max_key_points: usize,
    pub summary_max_length: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "research_outputs".to_string(),
            auto_save: false,
            default_format: "json".to_string(),
            max_key_points: 10,
            summary_max_length: 500,
        }
    }
}

/// Terminal presentation flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub rich_formatting: bool,
    pub progress_bars: bool,
    pub verbose: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            rich_formatting: true,
            progress_bars: true,
            verbose: false,
        }
    }
}

/// Disk cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
    /// Relative directories resolve against the current working directory.
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24,
            directory: ".cache".to_string(),
        }
    }
}

impl CacheConfig {
    /// TTL in seconds, as consumed by the disk cache.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_hours.saturating_mul(3600)
    }
}

impl Config {
    /// Default on-disk location: `~/.quarry/config.json`.
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quarry")
            .join("config.json")
    }

    /// Directory holding user template files: `~/.quarry/templates`.
    pub fn templates_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quarry")
            .join("templates")
    }

    /// Load from the default path. Missing or corrupt files yield defaults;
    /// a corrupt file additionally logs a warning.
    pub fn load() -> Self {
        let path = Self::path();
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(QuarryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
                Self::default()
            }
        }
    }

    /// Load and parse a config file. Unlike [`Config::load`], errors surface
    /// to the caller — the watcher uses this to reject bad reloads.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Persist to the default path as pretty JSON.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Persist to an explicit path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Update a single field through its dotted path, e.g. `cache.ttl_hours`.
    ///
    /// The raw value string is parsed as JSON first so numbers and booleans
    /// come through typed; anything unparseable is treated as a string.
    /// Unknown keys and type mismatches are rejected.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let value: Value = serde_json::from_str(raw).unwrap_or(Value::String(raw.to_string()));

        let mut tree = serde_json::to_value(&*self)?;
        let mut node = &mut tree;
        let parts: Vec<&str> = key.split('.').collect();
        for (i, part) in parts.iter().enumerate() {
            let obj = node
                .as_object_mut()
                .ok_or_else(|| QuarryError::Config(format!("'{key}' is not a settable field")))?;
            if i == parts.len() - 1 {
                if !obj.contains_key(*part) {
                    return Err(QuarryError::Config(format!("Unknown config key '{key}'")));
                }
                obj.insert((*part).to_string(), value);
                break;
            }
            node = obj
                .get_mut(*part)
                .ok_or_else(|| QuarryError::Config(format!("Unknown config key '{key}'")))?;
        }

        *self = serde_json::from_value(tree)
            .map_err(|e| QuarryError::Config(format!("Invalid value for '{key}': {e}")))?;
        Ok(())
    }

    /// Restore defaults and persist them.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::default();
        self.save()
    }

    /// Create the output directory, and the cache directory when caching
    /// is enabled.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output.directory)?;
        if self.cache.enabled {
            std::fs::create_dir_all(&self.cache.directory)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl_hours, 24);
        assert_eq!(cfg.cache.ttl_secs(), 86_400);
        assert_eq!(cfg.search.max_web_results, 8);
        assert_eq!(cfg.search.max_wikipedia_results, 3);
        assert_eq!(cfg.output.default_format, "json");
        assert!(cfg.model.max_tokens.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut cfg = Config::default();
        cfg.search.max_news_results = 12;
        cfg.save_to_path(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"cache":{"ttl_hours":1}}"#).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.cache.ttl_hours, 1);
        // Untouched sections keep their defaults.
        assert_eq!(loaded.search.max_web_results, 8);
        assert!(loaded.cache.enabled);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn set_typed_values() {
        let mut cfg = Config::default();
        cfg.set("cache.ttl_hours", "6").unwrap();
        assert_eq!(cfg.cache.ttl_hours, 6);
        cfg.set("cache.enabled", "false").unwrap();
        assert!(!cfg.cache.enabled);
        cfg.set("model.name", "gpt-4o").unwrap();
        assert_eq!(cfg.model.name, "gpt-4o");
        cfg.set("model.temperature", "0.7").unwrap();
        assert!((cfg.model.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.set("cache.bogus", "1").is_err());
        assert!(cfg.set("nonexistent.field", "1").is_err());
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let mut cfg = Config::default();
        let err = cfg.set("cache.ttl_hours", "soon").unwrap_err();
        assert!(err.to_string().contains("cache.ttl_hours"));
        // Config unchanged after the failed set.
        assert_eq!(cfg.cache.ttl_hours, 24);
    }

    #[test]
    fn ensure_directories_creates_both() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.output.directory = tmp.path().join("out").to_string_lossy().into_owned();
        cfg.cache.directory = tmp.path().join("cache").to_string_lossy().into_owned();
        cfg.ensure_directories().unwrap();
        assert!(tmp.path().join("out").is_dir());
        assert!(tmp.path().join("cache").is_dir());
    }
}
