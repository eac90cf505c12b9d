// Memory models - knowledge base entries built from uploaded files

use serde::{Deserialize, Serialize};

/// Kind of uploaded artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Text,
    Image,
    Pdf,
}

impl MemoryKind {
    /// Detect the kind from a MIME type: image/* is an image, application/pdf
    /// a pdf, everything else is treated as text
    pub fn from_mime(mime_type: &str) -> Self {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            MemoryKind::Image
        } else if mime == "application/pdf" {
            MemoryKind::Pdf
        } else {
            MemoryKind::Text
        }
    }

    /// MIME type sent to the model when the upload did not carry one
    pub fn default_mime(&self) -> &'static str {
        match self {
            MemoryKind::Text => "text/plain",
            MemoryKind::Image => "image/png",
            MemoryKind::Pdf => "application/pdf",
        }
    }
}

/// A knowledge base entry as stored under `memories/{id}`
/// Immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    /// Display name (the uploaded file name)
    pub name: String,
    /// Raw upload, base64 encoded
    pub content: String,
    /// AI generated understanding of the upload
    pub summary: String,
    /// Creation time, Unix epoch milliseconds
    pub timestamp: i64,
}

impl MemoryItem {
    pub fn new(kind: MemoryKind, name: String, content: String, summary: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name,
            content,
            summary,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// One file in an upload batch
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFile {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// File bytes, base64 encoded
    pub data: String,
}

/// Request to upload and analyze files
#[derive(Debug, Clone, Deserialize)]
pub struct UploadMemoriesRequest {
    pub files: Vec<UploadFile>,
}

/// A file that could not be turned into a memory
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub name: String,
    pub error: String,
}

/// Result of an upload batch
#[derive(Debug, Clone, Serialize, Default)]
pub struct UploadMemoriesResponse {
    pub created: Vec<MemoryItem>,
    pub failed: Vec<UploadFailure>,
}
