//! Use Cases Layer - Application Orchestration
//!
//! Sits between the pure domain and the adapters: reads the live
//! catalogue, calls the strict pricing entry points and records metrics.

pub mod quote_desk;

pub use quote_desk::{QuoteDesk, QuoteDeskError, Side};
