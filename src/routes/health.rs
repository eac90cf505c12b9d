// Health routes

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health - Liveness check
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.config.gemini_model,
    }))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
