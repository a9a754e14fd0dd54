//! Response cache with one JSON file per entry and TTL expiry.
//!
//! Entries live under a configurable directory as `<key>.json`, where the
//! key is a SHA-256 digest of `(tool, normalized query)`. A key maps to
//! exactly one file, so a `put` always replaces the previous value. Expiry
//! is judged against the entry's `created_at` timestamp and a fixed TTL.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// A single cached tool response, as serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The query as the caller supplied it (pre-normalization).
    pub query: String,
    /// Name of the tool that produced the result.
    pub tool: String,
    /// The cached result payload.
    pub result: Value,
    /// Unix timestamp when the entry was written.
    pub created_at: u64,
}

/// Aggregate cache statistics from a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `*.json` entry files present.
    pub total_entries: usize,
    /// Total size of entry files in bytes.
    pub total_bytes: u64,
    /// Entries that parse and are within TTL.
    pub valid_entries: usize,
    /// Entries that are expired or unreadable.
    pub expired_entries: usize,
}

/// File-per-key disk cache for tool responses.
pub struct DiskCache {
    dir: PathBuf,
    ttl_secs: u64,
    enabled: bool,
}

impl DiskCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// the first `put`; reads against a missing directory are plain misses.
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            ttl_secs,
            enabled,
        }
    }

    /// Build a cache from the loaded configuration.
    pub fn from_config(cache: &crate::config::CacheConfig) -> Self {
        Self::new(&cache.directory, cache.ttl_secs(), cache.enabled)
    }

    /// Derive the cache key for a search query: SHA-256 of the tool name
    /// and the normalized query (lowercased, trimmed), length-prefixed so
    /// that no `(tool, query)` pair can collide with another by moving
    /// bytes across the boundary.
    pub fn cache_key(tool: &str, query: &str) -> String {
        Self::exact_cache_key(tool, &query.trim().to_lowercase())
    }

    /// Derive a cache key without normalizing. For case-sensitive keys
    /// such as URLs, where `/Page-A` and `/page-a` are different resources.
    pub fn exact_cache_key(tool: &str, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update((tool.len() as u64).to_le_bytes());
        hasher.update(tool.as_bytes());
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a cached result by normalized query. Missing, corrupt, and
    /// expired entries all read as a miss. Always a miss when caching is
    /// disabled.
    pub fn get(&self, tool: &str, query: &str) -> Option<Value> {
        self.get_with_key(Self::cache_key(tool, query), tool)
    }

    /// Look up a cached result by exact, case-sensitive key.
    pub fn get_exact(&self, tool: &str, key: &str) -> Option<Value> {
        self.get_with_key(Self::exact_cache_key(tool, key), tool)
    }

    fn get_with_key(&self, key: String, tool: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        let path = self.entry_path(&key);
        let entry = read_entry(&path)?;
        if self.is_expired(&entry) {
            debug!(tool, "Cache entry expired");
            return None;
        }
        debug!(tool, "Cache hit");
        Some(entry.result)
    }

    /// Store a result under the normalized query key, replacing any
    /// previous value. Write failures are logged and swallowed; a failed
    /// write only costs a future cache miss. No-op when caching is
    /// disabled.
    pub fn put(&self, tool: &str, query: &str, result: Value) {
        self.put_with_key(Self::cache_key(tool, query), tool, query, result);
    }

    /// Store a result under an exact, case-sensitive key.
    pub fn put_exact(&self, tool: &str, key: &str, result: Value) {
        self.put_with_key(Self::exact_cache_key(tool, key), tool, key, result);
    }

    fn put_with_key(&self, key: String, tool: &str, query: &str, result: Value) {
        if !self.enabled {
            return;
        }
        let entry = CacheEntry {
            query: query.to_string(),
            tool: tool.to_string(),
            result,
            created_at: now_secs(),
        };
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), "Could not create cache directory: {}", e);
            return;
        }
        let path = self.entry_path(&key);
        match serde_json::to_string_pretty(&entry) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!(path = %path.display(), "Could not write cache entry: {}", e);
                }
            }
            Err(e) => warn!(tool, "Could not serialize cache entry: {}", e),
        }
    }

    /// Delete every entry file. Returns the number deleted. A missing
    /// cache directory counts as zero, not an error.
    pub fn clear(&self) -> usize {
        self.remove_matching(|_| true)
    }

    /// Delete only expired or unreadable entry files. Returns the number
    /// deleted.
    pub fn cleanup_expired(&self) -> usize {
        self.remove_matching(|entry| match entry {
            Some(e) => self.is_expired(e),
            None => true,
        })
    }

    /// Scan the cache directory and aggregate statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            total_entries: 0,
            total_bytes: 0,
            valid_entries: 0,
            expired_entries: 0,
        };
        for path in self.entry_files() {
            stats.total_entries += 1;
            if let Ok(meta) = std::fs::metadata(&path) {
                stats.total_bytes += meta.len();
            }
            match read_entry(&path) {
                Some(entry) if !self.is_expired(&entry) => stats.valid_entries += 1,
                _ => stats.expired_entries += 1,
            }
        }
        stats
    }

    // -- private helpers ---------------------------------------------------

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        now_secs().saturating_sub(entry.created_at) >= self.ttl_secs
    }

    /// All `*.json` files directly under the cache directory.
    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(reader) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        reader
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect()
    }

    fn remove_matching(&self, predicate: impl Fn(Option<&CacheEntry>) -> bool) -> usize {
        let mut deleted = 0;
        for path in self.entry_files() {
            let entry = read_entry(&path);
            if !predicate(entry.as_ref()) {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(path = %path.display(), "Could not delete cache entry: {}", e);
                }
            }
        }
        deleted
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
