// API key models - the credential pool used for Gemini calls

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A labeled Gemini credential. The id is the record's key under `api_keys`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyEntry {
    pub id: String,
    pub label: String,
    pub key: String,
    /// Unix epoch milliseconds
    pub created_at: i64,
}

/// Record body as stored under `api_keys/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredApiKey {
    #[serde(default)]
    pub label: String,
    pub key: String,
    #[serde(default)]
    pub created_at: i64,
}

impl ApiKeyEntry {
    pub fn from_stored(id: String, stored: StoredApiKey) -> Self {
        Self {
            id,
            label: stored.label,
            key: stored.key,
            created_at: stored.created_at,
        }
    }

    /// Public view: the secret itself never leaves the backend
    pub fn view(&self) -> ApiKeyView {
        ApiKeyView {
            id: self.id.clone(),
            label: self.label.clone(),
            masked_key: mask_secret(&self.key),
            fingerprint: fingerprint(&self.key),
            created_at: self.created_at,
        }
    }
}

/// API key as returned to clients; snake_case like the rest of the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKeyView {
    pub id: String,
    pub label: String,
    pub masked_key: String,
    pub fingerprint: String,
    pub created_at: i64,
}

/// Request to add a key
#[derive(Debug, Clone, Deserialize)]
pub struct AddApiKeyRequest {
    pub label: String,
    pub key: String,
}

/// Mask all but the last four characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "••••".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("••••{}", tail)
}

/// First 8 hex chars of SHA256(secret)
pub fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..4])
}
