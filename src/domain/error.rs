//! Pricing errors for the strict entry points.
//!
//! The default quoting API never fails: out-of-range inputs are clamped.
//! These errors are only produced by `try_quote` / `try_effective_b`,
//! which reject the inputs the sanitizing functions leave undefined.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("liquidity parameter b must be positive, got {0}")]
    NonPositiveLiquidity(f64),

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("unknown market phase: {0:?} (expected P1, P2 or P3)")]
    UnknownPhase(String),
}

pub type PricingResult<T> = std::result::Result<T, PricingError>;

/// Rejects NaN and infinities, naming the offending field.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> PricingResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NonFinite { field, value })
    }
}

/// Rejects negative values (after the finiteness check).
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> PricingResult<f64> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        Err(PricingError::Negative { field, value })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite_rejects_nan() {
        let err = ensure_finite("p_yes", f64::NAN).unwrap_err();
        assert!(matches!(err, PricingError::NonFinite { field: "p_yes", .. }));
    }

    #[test]
    fn test_ensure_non_negative() {
        assert_eq!(ensure_non_negative("volume_24h", 0.0), Ok(0.0));
        assert_eq!(
            ensure_non_negative("volume_24h", -1.0),
            Err(PricingError::Negative {
                field: "volume_24h",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = PricingError::NonPositiveLiquidity(-5.0);
        assert_eq!(err.to_string(), "liquidity parameter b must be positive, got -5");
    }
}
