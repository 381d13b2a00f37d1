//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. The market
//! catalogue lives here too, so milestone markets can be added or
//! re-priced without touching the domain layer.

pub mod hot_reload;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::domain::MarketSnapshot;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup and re-read by the
/// [`hot_reload::ConfigWatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
  /// Service identity and HTTP binding.
  pub service: ServiceConfig,
  /// Quoting defaults and limits.
  #[serde(default)]
  pub quoting: QuotingConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Milestone market catalogue.
  #[serde(default)]
  pub markets: Vec<MarketConfig>,
}

/// Service identity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// HTTP bind address for the quote API and probes.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  /// Seconds between config reload checks.
  #[serde(default = "default_reload_interval")]
  pub reload_interval_seconds: u64,
}

/// Quoting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotingConfig {
  /// Liquidity used by ad-hoc quotes that omit `b`.
  #[serde(default = "default_liquidity")]
  pub default_liquidity: f64,
  /// Largest accepted |trade size| for ad-hoc quotes.
  #[serde(default = "default_max_trade_size")]
  pub max_trade_size: f64,
  /// Trade sizes previewed on every market card.
  #[serde(default = "default_preview_sizes")]
  pub preview_sizes: Vec<f64>,
}

impl Default for QuotingConfig {
  fn default() -> Self {
    Self {
      default_liquidity: default_liquidity(),
      max_trade_size: default_max_trade_size(),
      preview_sizes: default_preview_sizes(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

/// Catalogue entry: a market snapshot plus its listing flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
  #[serde(flatten)]
  pub snapshot: MarketSnapshot,
  /// Whether the market is open for quoting.
  #[serde(default = "default_true")]
  pub active: bool,
}

impl AppConfig {
  /// Looks up a catalogue entry by id.
  pub fn market(&self, id: &str) -> Option<&MarketConfig> {
    self.markets.iter().find(|m| m.snapshot.id == id)
  }

  /// Markets open for quoting.
  pub fn active_markets(&self) -> impl Iterator<Item = &MarketSnapshot> {
    self.markets.iter().filter(|m| m.active).map(|m| &m.snapshot)
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_reload_interval() -> u64 {
  60
}

fn default_true() -> bool {
  true
}

fn default_liquidity() -> f64 {
  50.0
}

fn default_max_trade_size() -> f64 {
  100_000.0
}

fn default_preview_sizes() -> Vec<f64> {
  vec![1.0, 10.0, 50.0, 100.0]
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
