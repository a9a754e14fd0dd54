//! File-mtime polling watcher for hot-reloading config.
//!
//! Long-lived agent loops embed the toolkit and expect edits to
//! `~/.quarry/config.json` to take effect without a restart. The watcher
//! polls the file's mtime and emits the re-parsed [`Config`], suppressing
//! emissions when a rewrite left the content unchanged (editors and config
//! management tools routinely rewrite files without changing them).

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Polling-based config watcher.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, poll_interval: Duration) -> Self {
        Self {
            path,
            poll_interval,
        }
    }

    pub fn default_path(poll_interval: Duration) -> Self {
        Self::new(Config::path(), poll_interval)
    }

    /// Poll until shutdown, sending each config that re-parses to a value
    /// different from the last one sent. A file that fails to parse keeps
    /// the running configuration; a rewrite with identical content emits
    /// nothing.
    pub async fn watch(
        self,
        tx: mpsc::UnboundedSender<Config>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut last_mtime = mtime_of(&self.path);
        let mut last_sent: Option<Config> = None;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Config watcher shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if *shutdown_rx.borrow() {
                return;
            }

            // A deleted file (current = None) is not a change; the running
            // config stays in effect until the file reappears.
            let current = mtime_of(&self.path);
            if current.is_none() || current == last_mtime {
                continue;
            }
            last_mtime = current;

            let config = match Config::load_from_path(&self.path) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "Config reload rejected; keeping running configuration"
                    );
                    continue;
                }
            };

            if last_sent.as_ref() == Some(&config) {
                debug!(path = %self.path.display(), "Config rewritten without changes, skipping");
                continue;
            }

            debug!(path = %self.path.display(), "Config file changed, reloading");
            if tx.send(config.clone()).is_err() {
                warn!("Config watcher receiver dropped, stopping watcher");
                return;
            }
            last_sent = Some(config);
        }
    }
}

fn mtime_of(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn watcher_emits_on_change() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");
        std::fs::write(&cfg_path, "{}").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ConfigWatcher::new(cfg_path.clone(), Duration::from_millis(25));
        let handle = tokio::spawn(watcher.watch(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(40)).await;
        std::fs::write(&cfg_path, r#"{"cache":{"ttl_hours":2}}"#).unwrap();

        let loaded = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.cache.ttl_hours, 2);

        let _ = shutdown_tx.send(true);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn watcher_skips_rewrites_with_identical_content() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");
        std::fs::write(&cfg_path, "{}").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ConfigWatcher::new(cfg_path.clone(), Duration::from_millis(25));
        let handle = tokio::spawn(watcher.watch(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(40)).await;
        std::fs::write(&cfg_path, r#"{"cache":{"ttl_hours":2}}"#).unwrap();
        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.cache.ttl_hours, 2);

        // Rewrite the same content: mtime churns, config does not.
        tokio::time::sleep(Duration::from_millis(40)).await;
        std::fs::write(&cfg_path, r#"{"cache":{"ttl_hours":2}}"#).unwrap();
        let noop = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(noop.is_err(), "identical rewrite must not emit a config");

        // A real change still comes through.
        std::fs::write(&cfg_path, r#"{"cache":{"ttl_hours":3}}"#).unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.cache.ttl_hours, 3);

        let _ = shutdown_tx.send(true);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn watcher_keeps_running_config_on_bad_reload() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");
        std::fs::write(&cfg_path, "{}").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ConfigWatcher::new(cfg_path.clone(), Duration::from_millis(25));
        let handle = tokio::spawn(watcher.watch(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(40)).await;
        std::fs::write(&cfg_path, "{broken").unwrap();

        // No config should be emitted for the corrupt write.
        let emitted = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(emitted.is_err(), "corrupt reload must not emit a config");

        let _ = shutdown_tx.send(true);
        let _ = handle.await;
    }
}
