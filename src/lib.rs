//! LiqPass Pricing - Library Root
//!
//! Binary LMSR quoting and adaptive liquidity for LiqPass milestone
//! markets, plus the quote service built on top. Re-exports all modules
//! for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod usecases;
