// API key routes - credential pool management
// Endpoints: GET /v1/api-keys, POST /v1/api-keys, DELETE /v1/api-keys/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{AddApiKeyRequest, ApiKeyView};
use crate::AppState;

/// GET /v1/api-keys - Masked key list
async fn list_api_keys(State(state): State<AppState>) -> Result<Json<Vec<ApiKeyView>>, ApiError> {
    let keys = state.db.list_api_keys().await?;
    Ok(Json(keys.iter().map(|k| k.view()).collect()))
}

/// POST /v1/api-keys - Add a key to the pool
async fn add_api_key(
    State(state): State<AppState>,
    Json(request): Json<AddApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyView>), ApiError> {
    let label = request.label.trim();
    let key = request.key.trim();
    if label.is_empty() || key.is_empty() {
        return Err(ApiError::BadRequest("Both label and key are required".to_string()));
    }

    let entry = state.db.add_api_key(label, key).await?;
    Ok((StatusCode::CREATED, Json(entry.view())))
}

/// DELETE /v1/api-keys/:id - Remove a key from the pool
async fn remove_api_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_api_key(&key_id).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

pub fn api_keys_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/api-keys", get(list_api_keys).post(add_api_key))
        .route("/v1/api-keys/:id", delete(remove_api_key))
}
