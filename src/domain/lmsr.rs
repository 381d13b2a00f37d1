//! Logarithmic Market Scoring Rule (LMSR) quoting for binary markets.
//!
//! A LiqPass milestone market is described by its implied YES probability
//! rather than by raw inventory. Quoting reconstructs an equivalent
//! inventory point (`q_no = 0`, `q_yes = b * ln(p / (1 - p))`) and prices
//! trades against the binary cost function:
//!
//! `C(q_yes, q_no) = b * ln(exp(q_yes / b) + exp(q_no / b))`
//!
//! Reference: Hanson (2003) "Combinatorial Information Market Design"
//!
//! Every function here sanitizes instead of rejecting: probabilities are
//! clamped into `(1e-6, 1 - 1e-6)` and `b` is floored at `1e-6`, so a live
//! slider never produces a hard failure. `try_quote` is the opt-in strict
//! variant for callers that must reject garbage input.

use std::f64::consts::LN_2;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, PricingError, PricingResult};

/// Distance kept from 0 and 1 so `ln(p / (1 - p))` stays finite.
pub const PROBABILITY_EPSILON: f64 = 1e-6;

/// Floor applied to the liquidity parameter.
pub const MIN_LIQUIDITY: f64 = 1e-6;

/// Clamps a probability into the open interval `(ε, 1 - ε)`.
///
/// NaN passes through unchanged.
pub fn clamp_probability(p_yes: f64) -> f64 {
    p_yes.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Floors the liquidity parameter at [`MIN_LIQUIDITY`].
///
/// Zero and negative values are silently raised to the floor. NaN passes
/// through unchanged.
pub fn floor_liquidity(b: f64) -> f64 {
    if b < MIN_LIQUIDITY { MIN_LIQUIDITY } else { b }
}

/// Result of pricing a hypothetical trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Signed currency amount (negative when selling).
    pub cost: f64,
    /// Cost per share; 0 for an empty trade.
    pub avg_price: f64,
    /// Implied YES probability after the trade, in `[0, 1]`.
    pub p_yes_after: f64,
}

impl Quote {
    fn new(cost: f64, size: f64, p_yes_after: f64) -> Self {
        let avg_price = if size == 0.0 { 0.0 } else { cost / size };
        Self {
            cost,
            avg_price,
            p_yes_after: p_yes_after.clamp(0.0, 1.0),
        }
    }

    /// Formats the quote for display.
    pub fn display(&self) -> QuoteDisplay {
        QuoteDisplay {
            cost: format_currency(self.cost, 2),
            avg_price: format_currency(self.avg_price, 4),
            p_yes_after: format_percent(self.p_yes_after),
        }
    }
}

/// LMSR quoter for a binary (YES/NO) market with a fixed liquidity parameter.
///
/// The liquidity parameter `b` controls market depth:
/// - Higher `b` = slower price movement per share traded
/// - Lower `b` = faster price movement, smaller maker subsidy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryLmsrQuoter {
    b: f64,
}

impl BinaryLmsrQuoter {
    /// Creates a quoter, flooring `b` at [`MIN_LIQUIDITY`].
    pub fn new(b: f64) -> Self {
        Self {
            b: floor_liquidity(b),
        }
    }

    /// Strict constructor: rejects non-finite or non-positive `b`.
    pub fn try_new(b: f64) -> PricingResult<Self> {
        ensure_finite("b", b)?;
        if b <= 0.0 {
            return Err(PricingError::NonPositiveLiquidity(b));
        }
        Ok(Self::new(b))
    }

    /// Returns the (floored) liquidity parameter.
    pub fn liquidity(&self) -> f64 {
        self.b
    }

    /// LMSR cost function `C(q_yes, q_no)`.
    ///
    /// Evaluated with a log-sum-exp shift so large `q / b` cannot overflow.
    pub fn cost(&self, q_yes: f64, q_no: f64) -> f64 {
        let a = q_yes / self.b;
        let c = q_no / self.b;
        let m = a.max(c);
        self.b * (m + ((a - m).exp() + (c - m).exp()).ln())
    }

    /// Instantaneous YES price: `exp(q_yes/b) / (exp(q_yes/b) + exp(q_no/b))`.
    pub fn price_yes(&self, q_yes: f64, q_no: f64) -> f64 {
        logistic((q_yes - q_no) / self.b)
    }

    /// Instantaneous NO price (`1 - price_yes`).
    pub fn price_no(&self, q_yes: f64, q_no: f64) -> f64 {
        1.0 - self.price_yes(q_yes, q_no)
    }

    /// YES inventory that yields `p_yes` when `q_no = 0`.
    ///
    /// Closed-form inverse of the price formula: `q_yes = b * ln(p / (1 - p))`.
    pub fn implied_inventory(&self, p_yes: f64) -> f64 {
        let p = clamp_probability(p_yes);
        self.b * (p / (1.0 - p)).ln()
    }

    /// Prices buying `delta_yes` YES shares (negative sells).
    pub fn quote(&self, p_yes: f64, delta_yes: f64) -> Quote {
        let q_yes0 = self.implied_inventory(p_yes);
        let q_yes1 = q_yes0 + delta_yes;

        let cost = self.cost(q_yes1, 0.0) - self.cost(q_yes0, 0.0);
        let p_yes_after = self.price_yes(q_yes1, 0.0);

        Quote::new(cost, delta_yes, p_yes_after)
    }

    /// Prices buying `delta_no` NO shares (negative sells).
    ///
    /// `p_yes_after` falls as `delta_no` grows.
    pub fn quote_no(&self, p_yes: f64, delta_no: f64) -> Quote {
        let q_yes0 = self.implied_inventory(p_yes);

        let cost = self.cost(q_yes0, delta_no) - self.cost(q_yes0, 0.0);
        let p_yes_after = self.price_yes(q_yes0, delta_no);

        Quote::new(cost, delta_no, p_yes_after)
    }

    /// Number of YES shares a currency budget buys at the current price.
    ///
    /// Inverts `quote`: solves `cost(delta) = spend` in closed form,
    /// `delta = b * ln(e^(s/b) * (r + 1) - 1) - b * ln(r)` with
    /// `r = p / (1 - p)`. Negative budgets are treated as zero.
    pub fn shares_for_spend(&self, p_yes: f64, spend: f64) -> f64 {
        let spend = if spend < 0.0 { 0.0 } else { spend };
        let p = clamp_probability(p_yes);
        let ln_r = (p / (1.0 - p)).ln();
        // ln(1 + r) computed from p to avoid cancellation near p -> 0
        let ln_r_plus_1 = -(1.0 - p).ln();

        // ln(e^(s/b)(r+1) - 1) = s/b + ln(r+1) + ln(1 - e^(-s/b)/(r+1))
        let tail = (-(spend / self.b) - ln_r_plus_1).exp();
        spend + self.b * (ln_r_plus_1 + (-tail).ln_1p() - ln_r)
    }

    /// Quotes the trade a currency budget buys.
    pub fn quote_spend(&self, p_yes: f64, spend: f64) -> Quote {
        self.quote(p_yes, self.shares_for_spend(p_yes, spend))
    }

    /// Worst-case loss of the market maker for a binary market: `b * ln 2`.
    pub fn max_subsidy(&self) -> f64 {
        self.b * LN_2
    }
}

/// Prices buying `delta_yes` YES shares in a market at `p_yes` with liquidity `b`.
///
/// Total over finite inputs: `p_yes` is clamped and `b` floored.
pub fn quote(p_yes: f64, b: f64, delta_yes: f64) -> Quote {
    BinaryLmsrQuoter::new(b).quote(p_yes, delta_yes)
}

/// Strict variant of [`quote`].
///
/// Rejects non-finite inputs and non-positive `b`. Probabilities outside
/// `(0, 1)` are still clamped.
pub fn try_quote(p_yes: f64, b: f64, delta_yes: f64) -> PricingResult<Quote> {
    ensure_finite("p_yes", p_yes)?;
    let quoter = BinaryLmsrQuoter::try_new(b)?;
    ensure_finite("delta_yes", delta_yes)?;
    Ok(quoter.quote(p_yes, delta_yes))
}

/// Numerically stable `1 / (1 + exp(-x))`.
fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

// ────────────────────────────────────────────
// QuoteDisplay - formatted strings for the UI
// ────────────────────────────────────────────

/// Quote rendered the way the trading panel shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDisplay {
    /// e.g. `"$5.25"`, `"-$4.75"`
    pub cost: String,
    /// e.g. `"$0.5250"`
    pub avg_price: String,
    /// e.g. `"55.0%"`
    pub p_yes_after: String,
}

fn round_half_up(value: f64, dp: u32) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

fn format_currency(value: f64, dp: u32) -> String {
    let Some(rounded) = round_half_up(value, dp) else {
        return "n/a".to_string();
    };
    let precision = dp as usize;
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.precision$}", rounded.abs())
    } else {
        format!("${:.precision$}", rounded.abs())
    }
}

fn format_percent(p: f64) -> String {
    match round_half_up(p * 100.0, 1) {
        Some(pct) => format!("{pct:.1}%"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_quote_matches_cost_formula() {
        let q = quote(0.5, 50.0, 10.0);
        let expected_cost = 50.0 * ((10.0f64 / 50.0).exp() + 1.0).ln() - 50.0 * LN_2;
        assert_close(q.cost, expected_cost, 1e-9);
        assert_close(q.cost, 5.2496, 1e-3);
        assert_close(q.avg_price, 0.5250, 1e-3);
        assert_close(q.p_yes_after, 0.5498, 1e-3);
    }

    #[test]
    fn test_zero_trade_is_identity() {
        let q = quote(0.37, 80.0, 0.0);
        assert_eq!(q.cost, 0.0);
        assert_eq!(q.avg_price, 0.0);
        assert_close(q.p_yes_after, 0.37, 1e-12);
    }

    #[test]
    fn test_probability_is_clamped() {
        let q = quote(0.0, 50.0, 0.0);
        assert_close(q.p_yes_after, PROBABILITY_EPSILON, 1e-12);

        let q = quote(1.5, 50.0, 0.0);
        assert_close(q.p_yes_after, 1.0 - PROBABILITY_EPSILON, 1e-12);
    }

    #[test]
    fn test_non_positive_b_is_floored() {
        assert_eq!(BinaryLmsrQuoter::new(0.0).liquidity(), MIN_LIQUIDITY);
        assert_eq!(BinaryLmsrQuoter::new(-10.0).liquidity(), MIN_LIQUIDITY);

        let q = quote(0.5, -10.0, 1.0);
        assert!(q.cost.is_finite());
        assert!((0.0..=1.0).contains(&q.p_yes_after));
    }

    #[test]
    fn test_huge_trade_does_not_overflow() {
        let q = quote(0.5, 1.0, 1e6);
        assert!(q.cost.is_finite());
        assert_close(q.p_yes_after, 1.0, 1e-12);

        let q = quote(0.5, 1.0, -1e6);
        assert!(q.cost.is_finite());
        assert_close(q.p_yes_after, 0.0, 1e-12);
    }

    #[test]
    fn test_sell_returns_proceeds() {
        let q = quote(0.6, 100.0, -20.0);
        assert!(q.cost < 0.0, "selling must produce proceeds, got {}", q.cost);
        assert!(q.p_yes_after < 0.6);
        assert!(q.avg_price > 0.0 && q.avg_price < 0.6);
    }

    #[test]
    fn test_prices_sum_to_one() {
        let quoter = BinaryLmsrQuoter::new(100.0);
        let sum = quoter.price_yes(50.0, 30.0) + quoter.price_no(50.0, 30.0);
        assert_close(sum, 1.0, 1e-12);
    }

    #[test]
    fn test_implied_inventory_round_trips() {
        let quoter = BinaryLmsrQuoter::new(75.0);
        for p in [0.01, 0.2, 0.5, 0.8, 0.99] {
            let q_yes = quoter.implied_inventory(p);
            assert_close(quoter.price_yes(q_yes, 0.0), p, 1e-12);
        }
        assert_eq!(quoter.implied_inventory(0.5), 0.0);
    }

    #[test]
    fn test_quote_no_mirrors_quote_at_midpoint() {
        let quoter = BinaryLmsrQuoter::new(50.0);
        let yes = quoter.quote(0.5, 10.0);
        let no = quoter.quote_no(0.5, 10.0);
        assert_close(yes.cost, no.cost, 1e-12);
        assert_close(no.p_yes_after, 1.0 - yes.p_yes_after, 1e-12);
    }

    #[test]
    fn test_shares_for_spend_inverts_quote() {
        let quoter = BinaryLmsrQuoter::new(60.0);
        for (p, spend) in [(0.5, 5.0), (0.1, 12.5), (0.9, 40.0), (0.3, 0.01)] {
            let shares = quoter.shares_for_spend(p, spend);
            assert!(shares > 0.0);
            assert_close(quoter.quote(p, shares).cost, spend, 1e-9);
        }
    }

    #[test]
    fn test_shares_for_spend_zero_and_negative_budget() {
        let quoter = BinaryLmsrQuoter::new(60.0);
        assert_close(quoter.shares_for_spend(0.4, 0.0), 0.0, 1e-9);
        assert_close(quoter.shares_for_spend(0.4, -3.0), 0.0, 1e-9);
    }

    #[test]
    fn test_shares_for_huge_spend_stays_finite() {
        let quoter = BinaryLmsrQuoter::new(1.0);
        let shares = quoter.shares_for_spend(0.5, 1e6);
        assert!(shares.is_finite());
        // At p -> 1 each share costs ~1, so shares ~ spend.
        assert!(shares > 1e6);
    }

    #[test]
    fn test_max_subsidy() {
        assert_close(BinaryLmsrQuoter::new(100.0).max_subsidy(), 69.3147, 1e-4);
    }

    #[test]
    fn test_try_quote_rejects_garbage() {
        assert!(matches!(
            try_quote(f64::NAN, 50.0, 1.0),
            Err(PricingError::NonFinite { field: "p_yes", .. })
        ));
        assert!(matches!(
            try_quote(0.5, f64::INFINITY, 1.0),
            Err(PricingError::NonFinite { field: "b", .. })
        ));
        assert_eq!(
            try_quote(0.5, 0.0, 1.0),
            Err(PricingError::NonPositiveLiquidity(0.0))
        );
        assert_eq!(try_quote(0.5, 50.0, 10.0), Ok(quote(0.5, 50.0, 10.0)));
    }

    #[test]
    fn test_display_formatting() {
        let d = quote(0.5, 50.0, 10.0).display();
        assert_eq!(d.cost, "$5.25");
        assert_eq!(d.avg_price, "$0.5250");
        assert_eq!(d.p_yes_after, "55.0%");

        let d = quote(0.5, 50.0, -10.0).display();
        assert_eq!(d.cost, "-$4.75");
        assert_eq!(d.p_yes_after, "45.0%");

        let d = quote(0.5, 50.0, 0.0).display();
        assert_eq!(d.cost, "$0.00");
        assert_eq!(d.avg_price, "$0.0000");
    }

    #[test]
    fn test_quote_serializes_camel_case() {
        let json = serde_json::to_value(quote(0.5, 50.0, 0.0)).unwrap();
        assert!(json.get("avgPrice").is_some());
        assert!(json.get("pYesAfter").is_some());
    }
}
