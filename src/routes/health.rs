use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

// Public liveness probe; reports which quote source is wired in.
async fn health(State(state): State<AppState>) -> Json<Value> {
    debug!("GET /health - Health check");
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "quote_source": state.price_provider.name(),
    }))
}
