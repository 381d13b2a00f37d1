//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid configuration in {}", path.display()))?;

  info!(
    markets = config.markets.len(),
    default_liquidity = config.quoting.default_liquidity,
    bind = %config.service.bind_address,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse TOML")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive quoting limits and preview sizes
/// - Valid probability ranges (0..1)
/// - Unique, non-empty market ids
/// - Non-negative market activity
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service.name must not be empty"
  );
  anyhow::ensure!(
    config.service.reload_interval_seconds > 0,
    "service.reload_interval_seconds must be positive"
  );

  // Quoting validation
  let quoting = &config.quoting;
  anyhow::ensure!(
    quoting.default_liquidity.is_finite() && quoting.default_liquidity > 0.0,
    "quoting.default_liquidity must be positive, got {}",
    quoting.default_liquidity
  );
  anyhow::ensure!(
    quoting.max_trade_size.is_finite() && quoting.max_trade_size > 0.0,
    "quoting.max_trade_size must be positive, got {}",
    quoting.max_trade_size
  );
  anyhow::ensure!(
    !quoting.preview_sizes.is_empty(),
    "quoting.preview_sizes must not be empty"
  );
  for size in &quoting.preview_sizes {
    anyhow::ensure!(
      size.is_finite() && *size > 0.0,
      "quoting.preview_sizes entries must be positive, got {}",
      size
    );
  }

  // Market validation
  if config.markets.is_empty() {
    warn!("No markets configured - only ad-hoc quotes will be served");
  }

  let mut seen = HashSet::new();
  for (i, market) in config.markets.iter().enumerate() {
    let m = &market.snapshot;
    anyhow::ensure!(!m.id.is_empty(), "Market {} has empty id", i);
    anyhow::ensure!(
      seen.insert(m.id.as_str()),
      "Duplicate market id: {}",
      m.id
    );
    anyhow::ensure!(
      m.p_yes > 0.0 && m.p_yes < 1.0,
      "Market {} p_yes must be in (0, 1), got {}",
      m.id,
      m.p_yes
    );
    anyhow::ensure!(
      m.base_b.is_finite() && m.base_b > 0.0,
      "Market {} base_b must be positive, got {}",
      m.id,
      m.base_b
    );
    for (field, value) in [
      ("volume_24h", m.volume_24h),
      ("traders_24h", m.traders_24h),
      ("abs_change", m.abs_change),
    ] {
      anyhow::ensure!(
        value.is_finite() && value >= 0.0,
        "Market {} {} must be non-negative, got {}",
        m.id,
        field,
        value
      );
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Phase;

  const VALID: &str = r#"
    [service]
    name = "liqpass-quote"

    [quoting]
    default_liquidity = 40.0
    preview_sizes = [5.0, 25.0]

    [[markets]]
    id = "solar-m1"
    project = "Community Solar"
    milestone = "Panels installed"
    p_yes = 0.62
    base_b = 60
    phase = "P2"
    volume_24h = 12000.0
    traders_24h = 85

    [[markets]]
    id = "solar-m2"
    project = "Community Solar"
    milestone = "Grid connection"
    p_yes = 0.3
    base_b = 60.0
    active = false
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_parse_valid_config() {
    let config = parse_config(VALID).unwrap();
    assert_eq!(config.service.bind_address, "0.0.0.0:8080");
    assert_eq!(config.quoting.default_liquidity, 40.0);
    assert_eq!(config.quoting.max_trade_size, 100_000.0);
    assert!(config.metrics.enabled);
    assert_eq!(config.markets.len(), 2);

    let m1 = config.market("solar-m1").unwrap();
    assert_eq!(m1.snapshot.phase, Phase::P2);
    assert_eq!(m1.snapshot.base_b, 60.0);
    assert!(m1.active);
    assert_eq!(config.active_markets().count(), 1);
  }

  #[test]
  fn test_rejects_duplicate_ids() {
    let toml = VALID.replace("solar-m2", "solar-m1");
    let err = parse_config(&toml).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate market id"));
  }

  #[test]
  fn test_rejects_probability_out_of_range() {
    let toml = VALID.replace("p_yes = 0.62", "p_yes = 1.0");
    assert!(parse_config(&toml).is_err());
  }

  #[test]
  fn test_rejects_unknown_phase() {
    let toml = VALID.replace("phase = \"P2\"", "phase = \"P9\"");
    assert!(parse_config(&toml).is_err());
  }

  #[test]
  fn test_accepts_lowercase_phase() {
    let toml = VALID.replace("phase = \"P2\"", "phase = \"p3\"");
    let config = parse_config(&toml).unwrap();
    assert_eq!(config.market("solar-m1").unwrap().snapshot.phase, Phase::P3);
  }

  #[test]
  fn test_rejects_empty_preview_sizes() {
    let toml = VALID.replace("preview_sizes = [5.0, 25.0]", "preview_sizes = []");
    assert!(parse_config(&toml).is_err());
  }

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = parse_config("[service]\nname = \"q\"\n").unwrap();
    assert!(config.markets.is_empty());
    assert_eq!(config.quoting.preview_sizes, vec![1.0, 10.0, 50.0, 100.0]);
    assert_eq!(config.metrics.bind_address, "0.0.0.0:9090");
  }
}
