//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Wires the quote desk to the outside world. Each sub-module groups
//! adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `http`: quote API and health probes (axum)
//! - `metrics`: Prometheus metrics export and readiness state

pub mod http;
pub mod metrics;
