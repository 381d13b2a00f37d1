//! Milestone market snapshot.
//!
//! A LiqPass project card exposes one binary market per milestone. The
//! trading panel first derives the market's effective liquidity from its
//! phase and recent activity, then quotes trades against it.

use serde::{Deserialize, Serialize};

use super::adaptive::{effective_b, LiquidityInputs, Phase};
use super::lmsr::{BinaryLmsrQuoter, Quote};

/// Current state of a milestone market.
///
/// Read snake_case from config, written camelCase to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct MarketSnapshot {
    /// Unique market identifier (used in URLs).
    pub id: String,
    /// Project the milestone belongs to.
    pub project: String,
    /// Milestone description.
    pub milestone: String,
    /// Current implied YES probability.
    pub p_yes: f64,
    /// Base liquidity before phase/activity adjustment.
    pub base_b: f64,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub volume_24h: f64,
    #[serde(default)]
    pub traders_24h: f64,
    /// Absolute 24h price change in percentage points.
    #[serde(default)]
    pub abs_change: f64,
}

/// Quote for one preset trade size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotePreview {
    pub size: f64,
    pub quote: Quote,
}

impl MarketSnapshot {
    pub fn liquidity_inputs(&self) -> LiquidityInputs {
        LiquidityInputs {
            base_b: self.base_b,
            phase: self.phase,
            volume_24h: self.volume_24h,
            traders_24h: self.traders_24h,
            abs_change: self.abs_change,
        }
    }

    /// Adaptive liquidity of this market.
    pub fn effective_b(&self) -> f64 {
        effective_b(&self.liquidity_inputs())
    }

    /// Quoter at the market's effective liquidity.
    pub fn quoter(&self) -> BinaryLmsrQuoter {
        BinaryLmsrQuoter::new(self.effective_b())
    }

    pub fn quote_yes(&self, delta_yes: f64) -> Quote {
        self.quoter().quote(self.p_yes, delta_yes)
    }

    pub fn quote_no(&self, delta_no: f64) -> Quote {
        self.quoter().quote_no(self.p_yes, delta_no)
    }

    /// Quotes the YES trade that `spend` currency buys.
    pub fn quote_spend(&self, spend: f64) -> Quote {
        self.quoter().quote_spend(self.p_yes, spend)
    }

    /// YES quotes for each preset size.
    pub fn preview(&self, sizes: &[f64]) -> Vec<QuotePreview> {
        let quoter = self.quoter();
        sizes
            .iter()
            .map(|&size| QuotePreview {
                size,
                quote: quoter.quote(self.p_yes, size),
            })
            .collect()
    }
}
