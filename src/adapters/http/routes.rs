//! Quote API Handlers
//!
//! Thin axum handlers over the [`QuoteDesk`]. Query strings are parsed
//! by axum; pricing validation and errors come from the desk and are
//! mapped to JSON `{ "error": ... }` bodies.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::domain::LiquidityInputs;
use crate::usecases::quote_desk::{
  MarketQuoteRequest, MarketView, QuoteDeskError, QuoteRequest, QuoteResponse,
};

/// Desk error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QuoteDeskError);

impl From<QuoteDeskError> for ApiError {
  fn from(err: QuoteDeskError) -> Self {
    Self(err)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      QuoteDeskError::UnknownMarket(_) => StatusCode::NOT_FOUND,
      QuoteDeskError::InactiveMarket(_) => StatusCode::CONFLICT,
      _ => StatusCode::BAD_REQUEST,
    };
    warn!(status = status.as_u16(), error = %self.0, "Quote request rejected");
    (status, Json(json!({ "error": self.0.to_string() }))).into_response()
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveBResponse {
  pub effective_b: f64,
  pub phase_multiplier: f64,
}

/// `GET /v1/quote`
pub async fn quote(
  State(state): State<AppState>,
  Query(request): Query<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
  Ok(Json(state.desk.quote(&request)?))
}

/// `GET /v1/effective-b`
pub async fn effective_b(
  State(state): State<AppState>,
  Query(inputs): Query<LiquidityInputs>,
) -> Result<Json<EffectiveBResponse>, ApiError> {
  let effective_b = state.desk.effective_b(&inputs)?;
  Ok(Json(EffectiveBResponse {
    effective_b,
    phase_multiplier: inputs.phase.multiplier(),
  }))
}

/// `GET /v1/markets`
pub async fn markets(State(state): State<AppState>) -> Json<Vec<MarketView>> {
  Json(state.desk.markets())
}

/// `GET /v1/markets/:id`
pub async fn market(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Json<MarketView>, ApiError> {
  Ok(Json(state.desk.market(&id)?))
}

/// `GET /v1/markets/:id/quote`
pub async fn market_quote(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(request): Query<MarketQuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
  Ok(Json(state.desk.quote_market(&id, &request)?))
}
