// Realtime Database service - Firebase Realtime Database REST API
// Nodes: memories/{id}, settings, api_keys/{push id}

use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::DatabaseError;
use crate::models::{
    AgentSettings, ApiKeyEntry, MemoryItem, StoredApiKey, UpdateSettingsRequest,
};
use crate::services::events::{event_stream, DatabaseEvent};
use crate::services::google_auth::ServiceAccountAuth;

/// Database node paths
pub const MEMORIES_NODE: &str = "memories";
pub const SETTINGS_NODE: &str = "settings";
pub const API_KEYS_NODE: &str = "api_keys";

/// Nodes clients may observe
pub const OBSERVABLE_NODES: [&str; 3] = [MEMORIES_NODE, SETTINGS_NODE, API_KEYS_NODE];

/// How requests authenticate against the database
pub enum DatabaseAuth {
    /// Rules allow public access
    Anonymous,
    /// Legacy database secret, sent as `auth=`
    Secret(String),
    /// OAuth2 access token minted from a service account, sent as `access_token=`
    ServiceAccount(ServiceAccountAuth),
}

/// Validate a single key segment
pub fn validate_key(key: &str) -> Result<(), DatabaseError> {
    const FORBIDDEN: [char; 6] = ['.', '#', '$', '[', ']', '/'];
    if key.trim().is_empty() || key.contains(FORBIDDEN) || key.chars().any(char::is_control) {
        return Err(DatabaseError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn child_path(node: &str, key: &str) -> Result<String, DatabaseError> {
    validate_key(key)?;
    Ok(format!("{}/{}", node, urlencoding::encode(key)))
}

/// Realtime Database REST API client
pub struct RealtimeDbService {
    client: Client,
    base_url: String,
    auth: DatabaseAuth,
}

impl RealtimeDbService {
    pub fn new(client: Client, base_url: impl Into<String>, auth: DatabaseAuth) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, auth }
    }

    /// Build the service from configuration; a service account wins over a secret
    pub fn from_config(config: &Config) -> Result<Self, DatabaseError> {
        let base_url = config
            .firebase_database_url
            .clone()
            .ok_or_else(|| DatabaseError::Auth("FIREBASE_DATABASE_URL is not set".to_string()))?;
        let client = Client::new();

        let auth = if let Some(path) = &config.google_application_credentials {
            DatabaseAuth::ServiceAccount(ServiceAccountAuth::from_file(client.clone(), path)?)
        } else if let Some(secret) = &config.firebase_database_secret {
            DatabaseAuth::Secret(secret.clone())
        } else {
            DatabaseAuth::Anonymous
        };

        Ok(Self::new(client, base_url, auth))
    }

    /// Build a node URL: {base}/{path}.json
    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    /// Build request with auth query parameter
    async fn build_request(&self, method: Method, path: &str) -> Result<RequestBuilder, DatabaseError> {
        let req = self.client.request(method, self.node_url(path));
        Ok(match &self.auth {
            DatabaseAuth::Anonymous => req,
            DatabaseAuth::Secret(secret) => req.query(&[("auth", secret)]),
            DatabaseAuth::ServiceAccount(sa) => req.query(&[("access_token", sa.access_token().await?)]),
        })
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, DatabaseError> {
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                if let DatabaseAuth::ServiceAccount(sa) = &self.auth {
                    sa.invalidate().await;
                }
            }
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Realtime Database error ({}): {}", status, error_text);
            return Err(DatabaseError::Status {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    // =========================================================================
    // RAW NODE ACCESS
    // =========================================================================

    /// Read a node; a missing node is `Value::Null`
    pub async fn get_value(&self, path: &str) -> Result<Value, DatabaseError> {
        let req = self.build_request(Method::GET, path).await?;
        self.send(req).await
    }

    /// Replace a node
    pub async fn put_value<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), DatabaseError> {
        let req = self.build_request(Method::PUT, path).await?.json(value);
        self.send(req).await?;
        Ok(())
    }

    /// Merge children into a node
    pub async fn patch_value<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), DatabaseError> {
        let req = self.build_request(Method::PATCH, path).await?.json(value);
        self.send(req).await?;
        Ok(())
    }

    /// Append a child under a generated push id; returns the id
    pub async fn push_value<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<String, DatabaseError> {
        let req = self.build_request(Method::POST, path).await?.json(value);
        let response = self.send(req).await?;
        response
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string)
            .ok_or_else(|| DatabaseError::Status {
                status: 200,
                message: format!("push response without a name: {}", response),
            })
    }

    /// Delete a node; deleting a missing node succeeds
    pub async fn delete_value(&self, path: &str) -> Result<(), DatabaseError> {
        let req = self.build_request(Method::DELETE, path).await?;
        self.send(req).await?;
        Ok(())
    }

    /// Follow a node through the REST streaming protocol
    pub async fn listen(
        &self,
        path: &str,
    ) -> Result<BoxStream<'static, Result<DatabaseEvent, DatabaseError>>, DatabaseError> {
        let response = self
            .build_request(Method::GET, path)
            .await?
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DatabaseError::Status {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        tracing::info!("Listening to Realtime Database node {}", path);
        Ok(event_stream(response).boxed())
    }

    // =========================================================================
    // MEMORIES
    // =========================================================================

    /// All memories, newest first
    pub async fn list_memories(&self) -> Result<Vec<MemoryItem>, DatabaseError> {
        let value = self.get_value(MEMORIES_NODE).await?;
        let mut memories: Vec<MemoryItem> = children(value)
            .into_iter()
            .filter_map(|(id, v)| match serde_json::from_value::<MemoryItem>(v) {
                Ok(memory) => Some(memory),
                Err(e) => {
                    tracing::warn!("Skipping malformed memory {}: {}", id, e);
                    None
                }
            })
            .collect();

        memories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        tracing::debug!("Retrieved {} memories", memories.len());
        Ok(memories)
    }

    pub async fn add_memory(&self, memory: &MemoryItem) -> Result<(), DatabaseError> {
        self.put_value(&child_path(MEMORIES_NODE, &memory.id)?, memory).await?;
        tracing::info!("Saved memory {} ({})", memory.id, memory.name);
        Ok(())
    }

    pub async fn remove_memory(&self, id: &str) -> Result<(), DatabaseError> {
        self.delete_value(&child_path(MEMORIES_NODE, id)?).await?;
        tracing::info!("Deleted memory {}", id);
        Ok(())
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Read settings, seeding the defaults when the node is empty
    pub async fn get_settings(&self) -> Result<AgentSettings, DatabaseError> {
        let value = self.get_value(SETTINGS_NODE).await?;
        if value.is_null() {
            let defaults = AgentSettings::default();
            self.put_value(SETTINGS_NODE, &defaults).await?;
            tracing::info!("Seeded default agent settings");
            return Ok(defaults);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Merge the provided fields, then return the stored result
    pub async fn update_settings(&self, update: &UpdateSettingsRequest) -> Result<AgentSettings, DatabaseError> {
        if !update.is_empty() {
            self.patch_value(SETTINGS_NODE, update).await?;
            tracing::info!("Updated agent settings");
        }
        self.get_settings().await
    }

    // =========================================================================
    // API KEYS
    // =========================================================================

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKeyEntry>, DatabaseError> {
        let value = self.get_value(API_KEYS_NODE).await?;
        Ok(children(value)
            .into_iter()
            .filter_map(|(id, v)| match serde_json::from_value::<StoredApiKey>(v) {
                Ok(stored) => Some(ApiKeyEntry::from_stored(id, stored)),
                Err(e) => {
                    tracing::warn!("Skipping malformed api key record {}: {}", id, e);
                    None
                }
            })
            .collect())
    }

    pub async fn add_api_key(&self, label: &str, key: &str) -> Result<ApiKeyEntry, DatabaseError> {
        let stored = StoredApiKey {
            label: label.to_string(),
            key: key.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        let id = self.push_value(API_KEYS_NODE, &stored).await?;
        tracing::info!("Added API key {} ({})", id, label);
        Ok(ApiKeyEntry::from_stored(id, stored))
    }

    pub async fn remove_api_key(&self, id: &str) -> Result<(), DatabaseError> {
        self.delete_value(&child_path(API_KEYS_NODE, id)?).await?;
        tracing::info!("Deleted API key {}", id);
        Ok(())
    }
}

/// Children of an object node; arrays (sequential numeric keys) are indexed
fn children(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => vec![],
    }
}

/// Database errors come back as {"error": "..."}
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
