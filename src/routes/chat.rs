// Chat routes - reply drafting against the knowledge base
// Endpoints: GET /v1/chat/session, POST /v1/chat
// Messages are session-local; nothing here is persisted

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::error::{ApiError, LlmError};
use crate::llm::prompts::welcome_message;
use crate::llm::ClientImage;
use crate::models::{Attachment, AttachmentKind, ChatMessage, ChatRequest, ChatResponse, ChatSessionResponse};
use crate::AppState;

pub const GENERATION_FAILED_MESSAGE: &str =
    "Error generating response. Please check your API Keys in Settings.";

/// GET /v1/chat/session - Welcome message for a new session
async fn start_session(State(state): State<AppState>) -> Result<Json<ChatSessionResponse>, ApiError> {
    let settings = state.db.get_settings().await?;
    let memories = state.db.list_memories().await?;
    let keys = state.db.list_api_keys().await?;

    Ok(Json(ChatSessionResponse {
        welcome: ChatMessage::ai(welcome_message(&settings.role, memories.len())),
        role: settings.role,
        memories: memories.len(),
        rotated_keys: keys.len(),
    }))
}

/// POST /v1/chat - Draft a reply to a client message
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let image = request.image.as_ref().filter(|i| !i.data.trim().is_empty());
    if request.text.trim().is_empty() && image.is_none() {
        return Err(ApiError::BadRequest("Message text or image is required".to_string()));
    }

    let attachment = image.map(|i| Attachment {
        kind: AttachmentKind::Image,
        content: format!(
            "data:{};base64,{}",
            i.mime_type.as_deref().unwrap_or("image/png"),
            i.data.trim()
        ),
    });
    let message = ChatMessage::user(request.text.clone(), attachment);

    tracing::info!(
        "Drafting reply (image: {}): {}",
        image.is_some(),
        request.text.chars().take(50).collect::<String>()
    );

    let memories = state.db.list_memories().await?;
    let settings = state.db.get_settings().await?;
    let keys = state.db.list_api_keys().await?;

    let client_image = image.map(|i| ClientImage {
        data: i.data.trim(),
        mime_type: i.mime_type.as_deref(),
    });

    let result = state
        .agent
        .generate_agent_response(&message.text, client_image, &memories, &settings, &keys)
        .await;

    match result {
        Ok(reply) => Ok(Json(ChatResponse { message, reply: ChatMessage::ai(reply) }).into_response()),
        Err(e) => Ok(generation_failed(message, e)),
    }
}

/// Every generation failure, missing credentials included, is a 502. The UI shows
/// it as an AI bubble, so the body still carries both messages
fn generation_failed(message: ChatMessage, error: LlmError) -> Response {
    tracing::error!("Reply generation failed: {}", error);
    let status = StatusCode::BAD_GATEWAY;

    let reply = ChatMessage::ai(GENERATION_FAILED_MESSAGE.to_string());
    (status, Json(json!({ "error": GENERATION_FAILED_MESSAGE, "message": message, "reply": reply })))
        .into_response()
}

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/chat/session", get(start_session))
        .route("/v1/chat", post(send_message))
}

#[cfg(test)]
mod tests {
    use super::GENERATION_FAILED_MESSAGE;
    use crate::test_support::{empty_request, json_request, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_store(server: &MockServer, api_keys: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/memories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "m1": {"id": "m1", "type": "text", "name": "hours.txt", "content": "", "summary": "Open 9 to 5", "timestamp": 1}
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/settings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "role": "Barista", "tone": "Warm", "language": "English"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api_keys.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_keys))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_session_welcome() {
        let server = MockServer::start().await;
        mount_store(&server, json!({"-Na": {"label": "a", "key": "k", "createdAt": 1}})).await;

        let (status, body) = send(test_app(&server, None), empty_request("GET", "/v1/chat/session")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rotated_keys"], 1);
        assert_eq!(body["memories"], 1);
        assert_eq!(body["welcome"]["sender"], "ai");
        assert!(body["welcome"]["text"].as_str().unwrap().starts_with("Hello! I am your Barista."));
    }

    #[tokio::test]
    async fn test_reply_is_grounded_in_knowledge_base() {
        let server = MockServer::start().await;
        mount_store(&server, json!({"-Na": {"label": "a", "key": "pool-key", "createdAt": 1}})).await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "pool-key"))
            .and(body_string_contains("[Memory: hours.txt]\\nOpen 9 to 5"))
            .and(body_string_contains("Client Message: \\\"When do you open?\\\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "We open at 9! ☕"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = send(
            test_app(&server, Some("env-key")),
            json_request("POST", "/v1/chat", json!({"text": "When do you open?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"]["sender"], "user");
        assert_eq!(body["message"]["text"], "When do you open?");
        assert_eq!(body["reply"]["sender"], "ai");
        assert_eq!(body["reply"]["text"], "We open at 9! ☕");
    }

    #[tokio::test]
    async fn test_image_message_carries_attachment() {
        let server = MockServer::start().await;
        mount_store(&server, json!(null)).await;
        Mock::given(method("POST"))
            .and(header("x-goog-api-key", "env-key"))
            .and(body_string_contains("iVBOR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Nice latte!"}]}}]
            })))
            .mount(&server)
            .await;

        let (status, body) = send(
            test_app(&server, Some("env-key")),
            json_request(
                "POST",
                "/v1/chat",
                json!({"text": "", "image": {"data": "iVBOR", "mime_type": "image/jpeg"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"]["attachment"]["type"], "image");
        assert_eq!(body["message"]["attachment"]["content"], "data:image/jpeg;base64,iVBOR");
        assert_eq!(body["reply"]["text"], "Nice latte!");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let server = MockServer::start().await;
        let (status, _) = send(
            test_app(&server, None),
            json_request("POST", "/v1/chat", json!({"text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_bad_gateway() {
        let server = MockServer::start().await;
        mount_store(&server, json!(null)).await;

        let (status, body) = send(
            test_app(&server, None),
            json_request("POST", "/v1/chat", json!({"text": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"]["text"], "Hi");
        assert_eq!(body["reply"]["text"], GENERATION_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_friendly_reply() {
        let server = MockServer::start().await;
        mount_store(&server, json!({"-Na": {"label": "a", "key": "dead", "createdAt": 1}})).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let (status, body) = send(
            test_app(&server, None),
            json_request("POST", "/v1/chat", json!({"text": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], GENERATION_FAILED_MESSAGE);
        assert_eq!(body["reply"]["text"], GENERATION_FAILED_MESSAGE);
    }
}
