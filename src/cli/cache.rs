//! Cache command handler.

use anyhow::Result;

use quarry::cache::DiskCache;
use quarry::config::Config;

use super::CacheAction;

/// Inspect and maintain the response cache.
pub(crate) async fn cmd_cache(action: CacheAction) -> Result<()> {
    let config = Config::load();
    let cache = DiskCache::from_config(&config.cache);

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Cache directory: {}", config.cache.directory);
            println!("Enabled: {}", config.cache.enabled);
            println!("TTL: {} hours", config.cache.ttl_hours);
            println!("Entries: {}", stats.total_entries);
            println!("  valid:   {}", stats.valid_entries);
            println!("  expired: {}", stats.expired_entries);
            println!("Size: {}", human_bytes(stats.total_bytes));
        }
        CacheAction::Clear => {
            let deleted = cache.clear();
            println!("Deleted {} cache entries.", deleted);
        }
        CacheAction::Cleanup => {
            let deleted = cache.cleanup_expired();
            println!("Deleted {} expired cache entries.", deleted);
        }
    }
    Ok(())
}

fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_picks_sensible_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.00 MiB");
    }
}
