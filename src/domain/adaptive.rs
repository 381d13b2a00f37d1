//! Adaptive liquidity parameter.
//!
//! Young, thinly traded milestone markets get a small `b` so early trades
//! move the price; mature, busy or volatile markets get a larger `b` so
//! they resist manipulation:
//!
//! ```text
//! b_eff = round2(base_b * phase_mul * depth_lift * spike_lift)
//! depth_lift = 1 + 0.5 * vol_n + 0.35 * traders_n
//! spike_lift = 1 + 0.6 * spike
//! ```
//!
//! Volume saturates near 1e6, trader count near 1e3 and the absolute
//! price change at 30 percentage points.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, ensure_non_negative, PricingError, PricingResult};

/// Market maturity tier.
///
/// Deserializes through [`FromStr`], so `"p3"` in config or a query
/// string is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Phase {
    /// Newly listed milestone.
    #[default]
    P1,
    /// Funded and in progress.
    P2,
    /// Close to delivery.
    P3,
}

impl Phase {
    /// Liquidity multiplier of the tier.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::P1 => 0.75,
            Self::P2 => 1.0,
            Self::P3 => 1.25,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P1 => write!(f, "P1"),
            Self::P2 => write!(f, "P2"),
            Self::P3 => write!(f, "P3"),
        }
    }
}

impl FromStr for Phase {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            _ => Err(PricingError::UnknownPhase(s.to_string())),
        }
    }
}

impl TryFrom<String> for Phase {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Inputs of the adaptive-b heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityInputs {
    /// Base liquidity before adjustment (floored at 1).
    pub base_b: f64,
    pub phase: Phase,
    /// Traded volume over the last 24 hours.
    #[serde(default)]
    pub volume_24h: f64,
    /// Distinct traders over the last 24 hours.
    #[serde(default)]
    pub traders_24h: f64,
    /// Absolute price change over the last 24 hours, in percentage points.
    #[serde(default)]
    pub abs_change: f64,
}

impl LiquidityInputs {
    /// Inputs with no observed activity.
    pub fn new(base_b: f64, phase: Phase) -> Self {
        Self {
            base_b,
            phase,
            volume_24h: 0.0,
            traders_24h: 0.0,
            abs_change: 0.0,
        }
    }

    pub fn with_activity(mut self, volume_24h: f64, traders_24h: f64, abs_change: f64) -> Self {
        self.volume_24h = volume_24h;
        self.traders_24h = traders_24h;
        self.abs_change = abs_change;
        self
    }
}

/// Effective liquidity parameter, rounded to 2 decimal places.
///
/// Never fails. `base_b` below 1 is raised to 1 and negative activity
/// counts are treated as 0, so the result is at least `0.75` for finite
/// inputs.
pub fn effective_b(inputs: &LiquidityInputs) -> f64 {
    let base_b = if inputs.base_b < 1.0 { 1.0 } else { inputs.base_b };

    let vol_n = (inputs.volume_24h.max(0.0).ln_1p() / std::f64::consts::LN_10 / 6.0).clamp(0.0, 1.0);
    let traders_n =
        (inputs.traders_24h.max(0.0).ln_1p() / std::f64::consts::LN_10 / 3.0).clamp(0.0, 1.0);
    let spike = (inputs.abs_change / 30.0).clamp(0.0, 1.0);

    let depth_lift = 1.0 + 0.5 * vol_n + 0.35 * traders_n;
    let spike_lift = 1.0 + 0.6 * spike;

    round2(base_b * inputs.phase.multiplier() * depth_lift * spike_lift)
}

/// Strict variant of [`effective_b`].
///
/// Rejects non-finite values and negative activity counts.
pub fn try_effective_b(inputs: &LiquidityInputs) -> PricingResult<f64> {
    ensure_finite("base_b", inputs.base_b)?;
    ensure_non_negative("volume_24h", inputs.volume_24h)?;
    ensure_non_negative("traders_24h", inputs.traders_24h)?;
    ensure_non_negative("abs_change", inputs.abs_change)?;
    Ok(effective_b(inputs))
}

/// Rounds half away from zero to 2 decimal places.
///
/// Rounds the shortest decimal representation of `value`, not its binary
/// expansion: `round2(1.005)` is `1.01` even though the nearest `f64` to
/// 1.005 lies just below it, where `(x * 100.0).round() / 100.0` gives
/// `1.0`. Values `Decimal` cannot represent (NaN, infinities) pass through.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
