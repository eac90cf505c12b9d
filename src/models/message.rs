// Chat message models - ephemeral, never persisted

use serde::{Deserialize, Serialize};

/// Message sender type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub content: String,
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender: MessageSender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(text: String, attachment: Option<Attachment>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: MessageSender::User,
            text,
            attachment,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a new AI message
    pub fn ai(text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: MessageSender::Ai,
            text,
            attachment: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Image attached to a client message
#[derive(Debug, Clone, Deserialize)]
pub struct ChatImage {
    /// Image bytes, base64 encoded
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Request to draft a reply
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<ChatImage>,
}

/// The client's message echoed back with the drafted reply
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub reply: ChatMessage,
}

/// State for a new chat session
#[derive(Debug, Clone, Serialize)]
pub struct ChatSessionResponse {
    pub welcome: ChatMessage,
    pub role: String,
    pub memories: usize,
    pub rotated_keys: usize,
}
