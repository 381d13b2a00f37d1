//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export on :9090 and the liveness /
//! readiness probes mounted on the quote API router.

pub mod health;
pub mod prometheus;

pub use health::HealthState;
pub use self::prometheus::MetricsRegistry;
