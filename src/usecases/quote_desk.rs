//! Quote Desk - Quoting Against the Live Market Catalogue
//!
//! Serves three kinds of requests:
//! - Ad-hoc quotes for an arbitrary `(p_yes, b)` (the liquidity slider)
//! - Quotes against a catalogue market at its adaptive liquidity
//! - Effective-b lookups for arbitrary activity inputs
//!
//! The catalogue is read from a `watch` channel fed by the config
//! watcher, so re-priced markets show up without a restart. The desk
//! uses the strict domain entry points: garbage input is rejected here
//! instead of being silently clamped.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::config::AppConfig;
use crate::domain::error::{ensure_finite, ensure_non_negative};
use crate::domain::{
  try_effective_b, BinaryLmsrQuoter, LiquidityInputs, MarketSnapshot, PricingError, Quote,
  QuoteDisplay, QuotePreview,
};

/// Outcome side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  #[default]
  Yes,
  No,
}

impl Side {
  fn label(self) -> &'static str {
    match self {
      Self::Yes => "yes",
      Self::No => "no",
    }
  }
}

/// How much to trade: a share count or a currency budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeAmount {
  Shares(f64),
  Spend(f64),
}

impl TradeAmount {
  /// Resolves the `delta` / `spend` pair of a request.
  ///
  /// Exactly one of the two must be present. A negative budget is
  /// rejected; sell with a negative `delta` instead.
  pub fn from_parts(delta: Option<f64>, spend: Option<f64>) -> Result<Self, QuoteDeskError> {
    match (delta, spend) {
      (Some(delta), None) => Ok(Self::Shares(ensure_finite("delta", delta)?)),
      (None, Some(spend)) => Ok(Self::Spend(ensure_non_negative("spend", spend)?)),
      (Some(_), Some(_)) => Err(QuoteDeskError::AmbiguousAmount),
      (None, None) => Err(QuoteDeskError::MissingAmount),
    }
  }
}

/// Ad-hoc quote request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteRequest {
  pub p_yes: f64,
  /// Liquidity; the configured default when absent.
  pub b: Option<f64>,
  #[serde(default)]
  pub side: Side,
  /// Shares to buy (negative sells).
  #[serde(alias = "delta_yes")]
  pub delta: Option<f64>,
  /// Currency budget, as an alternative to `delta`.
  pub spend: Option<f64>,
}

/// Quote request against a catalogue market.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketQuoteRequest {
  #[serde(default)]
  pub side: Side,
  pub delta: Option<f64>,
  pub spend: Option<f64>,
}

/// A priced trade, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
  pub quote_id: Uuid,
  pub quoted_at_ms: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub market: Option<String>,
  pub side: Side,
  /// Shares traded (resolved from the budget for spend requests).
  pub size: f64,
  /// Liquidity the quote was priced at.
  pub b: f64,
  pub quote: Quote,
  pub display: QuoteDisplay,
}

/// Catalogue market with its derived pricing figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketView {
  #[serde(flatten)]
  pub snapshot: MarketSnapshot,
  pub effective_b: f64,
  pub max_subsidy: f64,
  pub previews: Vec<QuotePreview>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteDeskError {
  #[error("unknown market: {0}")]
  UnknownMarket(String),

  #[error("market {0} is not open for quoting")]
  InactiveMarket(String),

  #[error("trade size {size} exceeds the limit of {max}")]
  TradeTooLarge { size: f64, max: f64 },

  #[error("give either delta or spend, not both")]
  AmbiguousAmount,

  #[error("one of delta or spend is required")]
  MissingAmount,

  #[error(transparent)]
  Pricing(#[from] PricingError),
}

impl QuoteDeskError {
  /// Short label used as the metrics `reason`.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::UnknownMarket(_) => "unknown_market",
      Self::InactiveMarket(_) => "inactive_market",
      Self::TradeTooLarge { .. } => "trade_too_large",
      Self::AmbiguousAmount | Self::MissingAmount => "bad_amount",
      Self::Pricing(_) => "invalid_input",
    }
  }
}

/// Quotes against the live catalogue and records metrics.
#[derive(Clone)]
pub struct QuoteDesk {
  config_rx: watch::Receiver<AppConfig>,
  metrics: Arc<MetricsRegistry>,
}

impl QuoteDesk {
  pub fn new(config_rx: watch::Receiver<AppConfig>, metrics: Arc<MetricsRegistry>) -> Self {
    Self { config_rx, metrics }
  }

  /// All active markets with effective b, max subsidy and previews.
  ///
  /// Refreshes the per-market effective-b gauge.
  pub fn markets(&self) -> Vec<MarketView> {
    let started = Instant::now();
    let config = self.config_rx.borrow();
    let views: Vec<MarketView> = config
      .active_markets()
      .map(|m| self.view(m, &config.quoting.preview_sizes))
      .collect();
    self.observe_latency("catalogue", started);
    views
  }

  /// One active market.
  pub fn market(&self, id: &str) -> Result<MarketView, QuoteDeskError> {
    let started = Instant::now();
    let result = {
      let config = self.config_rx.borrow();
      self
        .lookup(&config, id)
        .map(|snapshot| self.view(snapshot, &config.quoting.preview_sizes))
    };
    self.observe_latency("catalogue", started);
    if let Err(e) = &result {
      self.record_error(e);
    }
    result
  }

  /// Quote a trade against a catalogue market at its effective b.
  #[instrument(skip(self, request), fields(side = ?request.side))]
  pub fn quote_market(
    &self,
    id: &str,
    request: &MarketQuoteRequest,
  ) -> Result<QuoteResponse, QuoteDeskError> {
    let started = Instant::now();
    let result = self.price_market(id, request);
    self.record("market", request.side, started, &result);
    result
  }

  /// Quote an arbitrary market state (the liquidity / size sliders).
  #[instrument(skip(self, request), fields(side = ?request.side))]
  pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, QuoteDeskError> {
    let started = Instant::now();
    let result = self.price_adhoc(request);
    self.record("adhoc", request.side, started, &result);
    result
  }

  /// Effective liquidity for arbitrary activity inputs.
  pub fn effective_b(&self, inputs: &LiquidityInputs) -> Result<f64, QuoteDeskError> {
    let started = Instant::now();
    let result = try_effective_b(inputs).map_err(QuoteDeskError::from);
    self.observe_latency("effective_b", started);
    if let Err(e) = &result {
      self.record_error(e);
    }
    result
  }

  fn price_market(
    &self,
    id: &str,
    request: &MarketQuoteRequest,
  ) -> Result<QuoteResponse, QuoteDeskError> {
    let config = self.config_rx.borrow();
    let snapshot = self.lookup(&config, id)?;
    let amount = TradeAmount::from_parts(request.delta, request.spend)?;
    let mut response = price(
      &snapshot.quoter(),
      snapshot.p_yes,
      request.side,
      amount,
      config.quoting.max_trade_size,
    )?;
    response.market = Some(snapshot.id.clone());
    Ok(response)
  }

  fn price_adhoc(&self, request: &QuoteRequest) -> Result<QuoteResponse, QuoteDeskError> {
    let (default_b, max_trade_size) = {
      let config = self.config_rx.borrow();
      (config.quoting.default_liquidity, config.quoting.max_trade_size)
    };
    ensure_finite("p_yes", request.p_yes)?;
    let quoter = BinaryLmsrQuoter::try_new(request.b.unwrap_or(default_b))?;
    let amount = TradeAmount::from_parts(request.delta, request.spend)?;
    price(&quoter, request.p_yes, request.side, amount, max_trade_size)
  }

  fn lookup<'a>(
    &self,
    config: &'a AppConfig,
    id: &str,
  ) -> Result<&'a MarketSnapshot, QuoteDeskError> {
    let entry = config
      .market(id)
      .ok_or_else(|| QuoteDeskError::UnknownMarket(id.to_string()))?;
    if !entry.active {
      return Err(QuoteDeskError::InactiveMarket(id.to_string()));
    }
    Ok(&entry.snapshot)
  }

  fn view(&self, snapshot: &MarketSnapshot, preview_sizes: &[f64]) -> MarketView {
    let quoter = snapshot.quoter();
    let effective_b = quoter.liquidity();
    self
      .metrics
      .effective_b
      .with_label_values(&[snapshot.id.as_str()])
      .set(effective_b);
    self
      .metrics
      .previews_rendered
      .inc_by(preview_sizes.len() as u64);

    MarketView {
      snapshot: snapshot.clone(),
      effective_b,
      max_subsidy: quoter.max_subsidy(),
      previews: snapshot.preview(preview_sizes),
    }
  }

  fn record(
    &self,
    source: &str,
    side: Side,
    started: Instant,
    result: &Result<QuoteResponse, QuoteDeskError>,
  ) {
    self.observe_latency(source, started);
    match result {
      Ok(response) => {
        self
          .metrics
          .quotes_served
          .with_label_values(&[side.label(), source])
          .inc();
        debug!(
          quote_id = %response.quote_id,
          b = response.b,
          size = response.size,
          cost = response.quote.cost,
          "Quote served"
        );
      }
      Err(e) => {
        self.record_error(e);
        debug!(error = %e, source, "Quote rejected");
      }
    }
  }

  fn observe_latency(&self, source: &str, started: Instant) {
    self
      .metrics
      .quote_latency_us
      .with_label_values(&[source])
      .observe(started.elapsed().as_secs_f64() * 1e6);
  }

  fn record_error(&self, err: &QuoteDeskError) {
    self
      .metrics
      .quote_errors
      .with_label_values(&[err.reason()])
      .inc();
  }
}

/// Prices a trade on either side.
///
/// The NO side of a market at `p` is the YES side of a market at `1 - p`,
/// which is how NO budgets are converted to shares.
fn price(
  quoter: &BinaryLmsrQuoter,
  p_yes: f64,
  side: Side,
  amount: TradeAmount,
  max_trade_size: f64,
) -> Result<QuoteResponse, QuoteDeskError> {
  let size = match (amount, side) {
    (TradeAmount::Shares(delta), _) => delta,
    (TradeAmount::Spend(spend), Side::Yes) => quoter.shares_for_spend(p_yes, spend),
    (TradeAmount::Spend(spend), Side::No) => quoter.shares_for_spend(1.0 - p_yes, spend),
  };
  if size.abs() > max_trade_size || !size.is_finite() {
    return Err(QuoteDeskError::TradeTooLarge {
      size,
      max: max_trade_size,
    });
  }

  let quote = match side {
    Side::Yes => quoter.quote(p_yes, size),
    Side::No => quoter.quote_no(p_yes, size),
  };

  Ok(QuoteResponse {
    quote_id: Uuid::new_v4(),
    quoted_at_ms: Utc::now().timestamp_millis(),
    market: None,
    side,
    size,
    b: quoter.liquidity(),
    quote,
    display: quote.display(),
  })
}
