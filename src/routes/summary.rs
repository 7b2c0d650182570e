use std::collections::HashMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Session, SummaryRequest, SummaryResponse};
use crate::services::summary_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_summary).post(summary_with_overrides))
}

pub async fn get_summary(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    info!("GET /summary - Valuing holdings for '{}'", session.username);
    summarize(&state, HashMap::new()).await
}

/// Same as `get_summary`, with manual prices for tickers the quote source missed.
pub async fn summary_with_overrides(
    session: Session,
    State(state): State<AppState>,
    Json(data): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    info!(
        "POST /summary - Valuing holdings with {} manual price(s) for '{}'",
        data.overrides.len(),
        session.username
    );
    summarize(&state, data.overrides).await
}

async fn summarize(
    state: &AppState,
    overrides: HashMap<String, f64>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = summary_service::portfolio_summary(
        state.store.as_ref(),
        state.price_provider.as_ref(),
        &state.failure_cache,
        overrides,
    )
        .await
        .map_err(|e| {
            error!("Failed to build portfolio summary: {}", e);
            e
        })?;
    Ok(Json(summary))
}
