//! Config Hot-Reload - Poll config.toml for Catalogue Changes
//!
//! Periodically re-reads config.toml and compares it with the last seen
//! contents. If changes are detected and the new file validates, the new
//! config is published on a `tokio::sync::watch` channel so the quote
//! desk serves re-priced markets without a restart.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use super::AppConfig;
use crate::adapters::metrics::MetricsRegistry;

/// Watches config.toml for changes and broadcasts updates.
///
/// Polls instead of using a filesystem watcher (portable across
/// Docker volumes). A file that fails validation is ignored and the
/// current config stays live.
pub struct ConfigWatcher {
    /// Path to config.toml.
    config_path: PathBuf,
    /// Poll interval.
    interval: Duration,
    /// Watch channel sender for config updates.
    config_tx: watch::Sender<AppConfig>,
    /// Hash of the last file contents seen. Starts empty, so the first
    /// check compares the file against the config the watcher was built
    /// with.
    last_hash: Option<u64>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ConfigWatcher {
    /// Create a new config watcher.
    ///
    /// Returns the watcher and a `watch::Receiver` that consumers
    /// can use to read the live config.
    pub fn new(
        config_path: impl Into<PathBuf>,
        initial_config: AppConfig,
    ) -> (Self, watch::Receiver<AppConfig>) {
        let interval = Duration::from_secs(initial_config.service.reload_interval_seconds);
        let (config_tx, config_rx) = watch::channel(initial_config);

        let watcher = Self {
            config_path: config_path.into(),
            interval,
            config_tx,
            last_hash: None,
            metrics: None,
        };

        (watcher, config_rx)
    }

    /// Record reload outcomes in the given registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run the config watcher loop until shutdown.
    #[instrument(skip(self, shutdown_rx), fields(path = %self.config_path.display()))]
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Config watcher started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Config watcher shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.check_and_reload().await;
                }
            }
        }
    }

    /// Check if config has changed and reload if so.
    ///
    /// Returns `true` when a new config was published.
    pub async fn check_and_reload(&mut self) -> bool {
        let new_hash = self.compute_hash().await;

        if new_hash == self.last_hash {
            debug!("Config unchanged");
            return false;
        }

        debug!("Config file changed, reloading");
        // Remember the broken contents too, so a bad file is reported once.
        self.last_hash = new_hash;

        match super::loader::load_config(&self.config_path) {
            Ok(new_config) if new_config == *self.config_tx.borrow() => {
                debug!("Config contents match the live config");
                false
            }
            Ok(new_config) => {
                self.record("applied");
                self.config_tx.send_replace(new_config);
                info!("Config reloaded successfully");
                true
            }
            Err(e) => {
                self.record("rejected");
                warn!(error = %format!("{e:#}"), "Failed to reload config - keeping current");
                false
            }
        }
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.config_reloads.with_label_values(&[outcome]).inc();
        }
    }

    /// Hash of the config file contents, `None` if unreadable.
    async fn compute_hash(&self) -> Option<u64> {
        let content = tokio::fs::read_to_string(&self.config_path).await.ok()?;

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Some(hasher.finish())
    }
}
