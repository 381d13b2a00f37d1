//! Prometheus Metrics Registry - Quoting Observability
//!
//! Registers and exposes Prometheus metrics on :9090 for Grafana
//! dashboards. Covers quote volume, latency, rejections, the live
//! effective liquidity of each catalogue market and config reloads.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the quote service.
///
/// All metrics follow the naming convention `liqpass_quote_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Quotes served on request, by side and source (`adhoc` / `market`).
    pub quotes_served: IntCounterVec,
    /// Preview quotes rendered on market listings.
    pub previews_rendered: IntCounter,
    /// Rejected quote requests, by reason.
    pub quote_errors: IntCounterVec,
    /// Desk call latency histogram (microseconds), by source.
    pub quote_latency_us: HistogramVec,
    /// Current effective liquidity per market.
    pub effective_b: GaugeVec,
    /// Config reload attempts, by outcome.
    pub config_reloads: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let quotes_served = IntCounterVec::new(
            Opts::new("liqpass_quote_quotes_served_total", "Total quotes served"),
            &["side", "source"],
        )?;

        let previews_rendered = IntCounter::new(
            "liqpass_quote_previews_rendered_total",
            "Preview quotes rendered on market listings",
        )?;

        let quote_errors = IntCounterVec::new(
            Opts::new(
                "liqpass_quote_errors_total",
                "Total quote requests rejected",
            ),
            &["reason"],
        )?;

        let quote_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "liqpass_quote_latency_us",
                "Quote desk call latency in microseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
            &["source"],
        )?;

        let effective_b = GaugeVec::new(
            Opts::new(
                "liqpass_quote_effective_b",
                "Adaptive liquidity parameter per market",
            ),
            &["market"],
        )?;

        let config_reloads = IntCounterVec::new(
            Opts::new(
                "liqpass_quote_config_reloads_total",
                "Config reload attempts",
            ),
            &["outcome"],
        )?;

        // Register all metrics
        registry.register(Box::new(quotes_served.clone()))?;
        registry.register(Box::new(previews_rendered.clone()))?;
        registry.register(Box::new(quote_errors.clone()))?;
        registry.register(Box::new(quote_latency_us.clone()))?;
        registry.register(Box::new(effective_b.clone()))?;
        registry.register(Box::new(config_reloads.clone()))?;

        Ok(Self {
            registry,
            quotes_served,
            previews_rendered,
            quote_errors,
            quote_latency_us,
            effective_b,
            config_reloads,
        })
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
