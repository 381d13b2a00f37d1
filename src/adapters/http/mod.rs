//! Quote API Server
//!
//! Exposes the quote desk over HTTP (axum 0.7) together with the
//! liveness / readiness probes. All routes are `GET` and stateless
//! apart from the shared catalogue.

pub mod routes;

use anyhow::Result;
use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::adapters::metrics::health::{self, HealthState};
use crate::usecases::quote_desk::QuoteDesk;

/// Shared state of the quote API.
#[derive(Clone)]
pub struct AppState {
  pub desk: QuoteDesk,
  pub health: HealthState,
}

impl FromRef<AppState> for HealthState {
  fn from_ref(state: &AppState) -> Self {
    state.health.clone()
  }
}

/// Build the quote API router.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/live", get(health::liveness))
    .route("/ready", get(health::readiness))
    .route("/v1/quote", get(routes::quote))
    .route("/v1/effective-b", get(routes::effective_b))
    .route("/v1/markets", get(routes::markets))
    .route("/v1/markets/:id", get(routes::market))
    .route("/v1/markets/:id/quote", get(routes::market_quote))
    .with_state(state)
}

/// Serve the quote API until shutdown.
#[instrument(skip(state, shutdown_rx))]
pub async fn serve(
  state: AppState,
  bind_address: String,
  mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
  let app = router(state);

  let listener = tokio::net::TcpListener::bind(&bind_address).await?;
  info!(address = %bind_address, "Quote API server started");

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      let _ = shutdown_rx.recv().await;
    })
    .await?;

  Ok(())
}
