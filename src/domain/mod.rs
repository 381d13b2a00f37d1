//! Domain layer - Pure pricing logic.
//!
//! Binary LMSR quoting, the adaptive liquidity heuristic and the milestone
//! market snapshot that composes them. No I/O and no logging here; every
//! function is safe to call from any thread.

pub mod adaptive;
pub mod error;
pub mod lmsr;
pub mod market;

// Re-export core types for convenience
pub use adaptive::{effective_b, try_effective_b, LiquidityInputs, Phase};
pub use error::{PricingError, PricingResult};
pub use lmsr::{quote, try_quote, BinaryLmsrQuoter, Quote, QuoteDisplay};
pub use market::{MarketSnapshot, QuotePreview};
