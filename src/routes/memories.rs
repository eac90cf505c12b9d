// Memories routes - knowledge base
// Endpoints: GET /v1/memories, POST /v1/memories, DELETE /v1/memories/:id

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::llm::{AnalysisInput, KnowledgeAgent};
use crate::llm::agent::decode_text_upload;
use crate::models::{
    ApiKeyEntry, MemoryItem, MemoryKind, UploadFailure, UploadFile, UploadMemoriesRequest,
    UploadMemoriesResponse,
};
use crate::services::RealtimeDbService;
use crate::AppState;

/// GET /v1/memories - All memories, newest first
async fn get_memories(State(state): State<AppState>) -> Result<Json<Vec<MemoryItem>>, ApiError> {
    let memories = state.db.list_memories().await?;
    tracing::info!("Returning {} memories", memories.len());
    Ok(Json(memories))
}

/// POST /v1/memories - Analyze uploads and store them as memories
/// Files are processed one at a time; a failing file is reported, not fatal
async fn upload_memories(
    State(state): State<AppState>,
    Json(request): Json<UploadMemoriesRequest>,
) -> Result<Json<UploadMemoriesResponse>, ApiError> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest("No files to analyze".to_string()));
    }

    let keys = state.db.list_api_keys().await?;
    let total = request.files.len();
    let mut result = UploadMemoriesResponse::default();

    for (i, file) in request.files.into_iter().enumerate() {
        tracing::info!("Analyzing {}/{}: {}", i + 1, total, file.name);

        match ingest_file(&state.db, &state.agent, &keys, &file).await {
            Ok(memory) => result.created.push(memory),
            Err(e) => {
                tracing::error!("Error processing {}: {}", file.name, e);
                result.failed.push(UploadFailure { name: file.name, error: e.to_string() });
            }
        }
    }

    tracing::info!(
        "Upload finished: {} created, {} failed",
        result.created.len(),
        result.failed.len()
    );
    Ok(Json(result))
}

/// Analyze one upload and persist the resulting memory
async fn ingest_file(
    db: &RealtimeDbService,
    agent: &KnowledgeAgent,
    keys: &[ApiKeyEntry],
    file: &UploadFile,
) -> Result<MemoryItem, ApiError> {
    if file.name.trim().is_empty() {
        return Err(ApiError::BadRequest("File name is empty".to_string()));
    }

    let mime_type = file.mime_type.as_deref();
    let kind = MemoryKind::from_mime(mime_type.unwrap_or_default());

    let summary = match kind {
        MemoryKind::Text => {
            let text = decode_text_upload(&file.data)
                .map_err(|e| ApiError::BadRequest(format!("Invalid base64 data: {}", e)))?;
            agent.analyze_content(AnalysisInput::Text(&text), keys).await?
        }
        MemoryKind::Image | MemoryKind::Pdf => {
            let input = AnalysisInput::Inline { kind, data: file.data.trim(), mime_type };
            agent.analyze_content(input, keys).await?
        }
    };

    let memory = MemoryItem::new(kind, file.name.clone(), file.data.trim().to_string(), summary);
    db.add_memory(&memory).await?;
    Ok(memory)
}

/// DELETE /v1/memories/:id - Delete a memory
async fn delete_memory(
    State(state): State<AppState>,
    Path(memory_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_memory(&memory_id).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

pub fn memories_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/memories", get(get_memories).post(upload_memories))
        .route("/v1/memories/:id", delete(delete_memory))
}
