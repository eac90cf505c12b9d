// Error types for the store client, the Gemini client and the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors from the Realtime Database REST client
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Realtime Database request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON from Realtime Database: {0}")]
    Json(#[from] serde_json::Error),

    /// Keys may not be empty or contain `.`, `#`, `$`, `[`, `]` or `/`
    #[error("Invalid database key: {0:?}")]
    InvalidKey(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Errors from the Gemini API and the credential rotation around it
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No API keys in the key store and GEMINI_API_KEY is not set")]
    NoCredentials,

    #[error("All {attempts} API keys failed or were rate limited: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<LlmError>,
    },
}

impl LlmError {
    /// HTTP status reported by the provider, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
            LlmError::NoCredentials => None,
            LlmError::Exhausted { last, .. } => last.status(),
        }
    }

    /// 429, or a message that mentions 429
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429) || self.to_string().contains("429")
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Error returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::BAD_GATEWAY,
            ApiError::Llm(LlmError::NoCredentials) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Llm(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
