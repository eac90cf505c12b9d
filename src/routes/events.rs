// Event routes - relays Realtime Database changes as server-sent events
// Endpoint: GET /v1/events/:node (memories | settings | api_keys)

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::{Stream, StreamExt};

use crate::error::ApiError;
use crate::services::realtime_db::{API_KEYS_NODE, OBSERVABLE_NODES};
use crate::services::DatabaseEvent;
use crate::AppState;

/// GET /v1/events/:node - Stream changes to one store node
async fn observe_node(
    State(state): State<AppState>,
    Path(node): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    if !OBSERVABLE_NODES.contains(&node.as_str()) {
        return Err(ApiError::NotFound(format!("Unknown node: {}", node)));
    }

    let upstream = state.db.listen(&node).await?;
    let redact = node == API_KEYS_NODE;
    tracing::info!("Client subscribed to {}", node);

    let stream = upstream.filter_map(move |event| async move {
        match event {
            Ok(DatabaseEvent::KeepAlive) => None,
            Ok(event) => {
                let event = if redact { redact_secrets(event) } else { event };
                Some(Event::default().event(event.name()).json_data(&event))
            }
            Err(e) => {
                tracing::warn!("Realtime Database stream failed: {}", e);
                Some(Ok(Event::default().event("error").data(e.to_string())))
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

const MASKED_SECRET: &str = "••••";

/// A member or path naming a key secret: `key` itself, or a multi-path update
/// such as `-Na/key`
fn is_secret_field(name: &str) -> bool {
    name == "key" || name.ends_with("/key")
}

/// Secrets never leave the backend; mask every key field in api_keys payloads
fn redact_secrets(event: DatabaseEvent) -> DatabaseEvent {
    fn scrub(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (name, child) in map.iter_mut() {
                    if is_secret_field(name) && child.is_string() {
                        *child = serde_json::Value::String(MASKED_SECRET.to_string());
                    } else {
                        scrub(child);
                    }
                }
            }
            serde_json::Value::Array(items) => items.iter_mut().for_each(scrub),
            _ => {}
        }
    }

    fn redact(path: &str, data: &mut serde_json::Value) {
        if is_secret_field(path) && data.is_string() {
            *data = serde_json::Value::String(MASKED_SECRET.to_string());
        }
        scrub(data);
    }

    match event {
        DatabaseEvent::Put { path, mut data } => {
            redact(&path, &mut data);
            DatabaseEvent::Put { path, data }
        }
        DatabaseEvent::Patch { path, mut data } => {
            redact(&path, &mut data);
            DatabaseEvent::Patch { path, data }
        }
        other => other,
    }
}

pub fn events_routes() -> Router<AppState> {
    Router::new().route("/v1/events/:node", get(observe_node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_request, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_redact_secrets() {
        let event = DatabaseEvent::Put {
            path: "/".to_string(),
            data: json!({"-Na": {"label": "a", "key": "AIzaSecret", "createdAt": 1}}),
        };
        match redact_secrets(event) {
            DatabaseEvent::Put { data, .. } => {
                assert_eq!(data["-Na"]["key"], "••••");
                assert_eq!(data["-Na"]["label"], "a");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let event = DatabaseEvent::Put { path: "/-Na/key".to_string(), data: json!("AIzaSecret") };
        match redact_secrets(event) {
            DatabaseEvent::Put { data, .. } => assert_eq!(data, json!("••••")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_redact_secrets_in_multi_path_patch() {
        let event = DatabaseEvent::Patch {
            path: "/".to_string(),
            data: json!({"-Na/key": "AIzaSecret", "-Na/label": "primary", "-Nb": {"key": "AIzaOther"}}),
        };
        let redacted = redact_secrets(event);
        let wire = serde_json::to_string(&redacted).unwrap();
        assert!(!wire.contains("AIzaSecret"));
        assert!(!wire.contains("AIzaOther"));
        match redacted {
            DatabaseEvent::Patch { data, .. } => {
                assert_eq!(data["-Na/key"], "••••");
                assert_eq!(data["-Na/label"], "primary");
                assert_eq!(data["-Nb"]["key"], "••••");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let event = DatabaseEvent::Patch { path: "/-Na/key".to_string(), data: json!("AIzaSecret") };
        match redact_secrets(event) {
            DatabaseEvent::Patch { data, .. } => assert_eq!(data, json!("••••")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_node_is_not_found() {
        let server = MockServer::start().await;
        let (status, _) = send(test_app(&server, None), empty_request("GET", "/v1/events/secrets")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relays_changes_as_sse() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: put\ndata: {\"path\":\"/\",\"data\":{\"role\":\"Concierge\"}}\n\n",
            "event: keep-alive\ndata: null\n\n",
            "event: cancel\ndata: \"Permission denied\"\n\n",
        );
        Mock::given(method("GET"))
            .and(path("/settings.json"))
            .and(header("accept", "text/event-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"))
            .mount(&server)
            .await;

        let response = test_app(&server, None)
            .oneshot(empty_request("GET", "/v1/events/settings"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: put"));
        assert!(text.contains("\"role\":\"Concierge\""));
        assert!(text.contains("event: cancel"));
        assert!(!text.contains("keep-alive\ndata: null"));
    }
}
