//! LiqPass Quote Service - Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate (path from argv[1] or LIQPASS_CONFIG)
//! 2. Init tracing (JSON structured logging)
//! 3. Build the metrics registry and the config watcher
//! 4. Log the opening quote board for every active market
//! 5. Spawn the quote API, the metrics server and the config watcher
//! 6. Wait for SIGINT → readiness 503 → broadcast shutdown → drain

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use liqpass_pricing::adapters::http::{self, AppState};
use liqpass_pricing::adapters::metrics::{HealthState, MetricsRegistry};
use liqpass_pricing::config::hot_reload::ConfigWatcher;
use liqpass_pricing::config::loader::load_config;
use liqpass_pricing::usecases::QuoteDesk;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LIQPASS_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        markets = config.markets.len(),
        "Starting LiqPass quote service"
    );

    // ── 3. Shared components ────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = HealthState::new();
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);

    let bind_address = config.service.bind_address.clone();
    let metrics_config = config.metrics.clone();

    let (watcher, config_rx) = ConfigWatcher::new(&config_path, config);
    let mut watcher = watcher.with_metrics(Arc::clone(&metrics));
    let desk = QuoteDesk::new(config_rx, Arc::clone(&metrics));

    // ── 4. Opening quote board ──────────────────────────────
    log_quote_board(&desk);

    // ── 5. Spawn tasks ──────────────────────────────────────
    let api_state = AppState {
        desk: desk.clone(),
        health: health.clone(),
    };
    let api_shutdown = shutdown_tx.subscribe();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(api_state, bind_address, api_shutdown).await {
            error!(error = %e, "Quote API server failed");
        }
    });

    let metrics_handle = if metrics_config.enabled {
        let metrics_shutdown = shutdown_tx.subscribe();
        let metrics_ref = Arc::clone(&metrics);
        Some(tokio::spawn(async move {
            if let Err(e) = metrics_ref
                .serve(metrics_config.bind_address, metrics_shutdown)
                .await
            {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        warn!("Metrics export disabled");
        None
    };

    let watcher_shutdown = shutdown_tx.subscribe();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.run(watcher_shutdown).await {
            error!(error = %e, "Config watcher failed");
        }
    });

    info!("All tasks spawned - quote service is running");

    // ── 6. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for SIGINT, shutting down");
    } else {
        info!("SIGINT received, initiating graceful shutdown");
    }

    // Stop advertising readiness before closing listeners
    health.begin_shutdown();
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(Duration::from_secs(10), api_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), watcher_handle).await;

    info!("Shutdown complete");
    Ok(())
}

/// Log effective liquidity and preview quotes of every active market.
fn log_quote_board(desk: &QuoteDesk) {
    let views = desk.markets();
    if views.is_empty() {
        warn!("No active markets configured - serving ad-hoc quotes only");
        return;
    }

    for view in views {
        let previews: Vec<String> = view
            .previews
            .iter()
            .map(|p| format!("{}@{}", p.size, p.quote.display().cost))
            .collect();
        info!(
            market = %view.snapshot.id,
            project = %view.snapshot.project,
            p_yes = view.snapshot.p_yes,
            phase = %view.snapshot.phase,
            effective_b = view.effective_b,
            max_subsidy = view.max_subsidy,
            previews = ?previews,
            "Market listed"
        );
    }
}
