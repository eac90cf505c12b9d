// Settings routes - agent persona
// Endpoints: GET /v1/settings, PATCH /v1/settings

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ApiError;
use crate::models::{AgentSettings, UpdateSettingsRequest};
use crate::AppState;

/// GET /v1/settings - Current persona (defaults are seeded on first read)
async fn get_settings(State(state): State<AppState>) -> Result<Json<AgentSettings>, ApiError> {
    Ok(Json(state.db.get_settings().await?))
}

/// PATCH /v1/settings - Merge the provided fields
async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<AgentSettings>, ApiError> {
    tracing::info!(
        "Updating settings (role: {}, tone: {}, language: {})",
        request.role.is_some(),
        request.tone.is_some(),
        request.language.is_some()
    );
    Ok(Json(state.db.update_settings(&request).await?))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/v1/settings", get(get_settings).patch(update_settings))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{empty_request, json_request, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_settings_returns_stored_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "role": "Concierge", "tone": "Warm", "language": "English"
            })))
            .mount(&server)
            .await;

        let (status, body) = send(test_app(&server, None), empty_request("GET", "/v1/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"role": "Concierge", "tone": "Warm", "language": "English"}));
    }

    #[tokio::test]
    async fn test_patch_settings_merges() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/settings.json"))
            .and(body_json(json!({"language": "English"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"language": "English"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/settings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "role": "Customer Support Specialist",
                "tone": "Professional yet friendly",
                "language": "English"
            })))
            .mount(&server)
            .await;

        let (status, body) = send(
            test_app(&server, None),
            json_request("PATCH", "/v1/settings", json!({"language": "English"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "English");
        assert_eq!(body["role"], "Customer Support Specialist");
    }
}
