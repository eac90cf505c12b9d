// Google service account auth for the Realtime Database REST API
// Signs a JWT with the service account key and exchanges it for an OAuth2 access token

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::DatabaseError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DATABASE_SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

/// Service account credentials from JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    private_key: String,
    token_uri: Option<String>,
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
struct GoogleJwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Cached access token with expiration
struct CachedToken {
    token: String,
    expires_at: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Mints and caches access tokens for one service account
pub struct ServiceAccountAuth {
    client: Client,
    credentials: ServiceAccountCredentials,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(client: Client, credentials: ServiceAccountCredentials) -> Self {
        Self {
            client,
            credentials,
            cached_token: RwLock::new(None),
        }
    }

    /// Load service account credentials from a JSON key file
    pub fn from_file(client: Client, path: &str) -> Result<Self, DatabaseError> {
        tracing::info!("Loading service account credentials from: {}", path);

        let creds_json = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::Auth(format!("Failed to read credentials file {}: {}", path, e))
        })?;
        let credentials = parse_credentials(&creds_json)?;

        tracing::info!("Loaded credentials for service account: {}", credentials.client_email);
        Ok(Self::new(client, credentials))
    }

    /// Get access token, using cache if valid or refreshing if needed
    pub async fn access_token(&self) -> Result<String, DatabaseError> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                // Use token if it has at least 60 seconds left
                if cached.expires_at > Utc::now().timestamp() + 60 {
                    return Ok(cached.token.clone());
                }
            }
        }

        let response = self.fetch_token().await?;

        // Tokens are valid for 1 hour; refresh 5 minutes early
        let lifetime = response.expires_in.unwrap_or(3600).saturating_sub(300).max(60);
        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at: Utc::now().timestamp() + lifetime,
        });

        Ok(response.access_token)
    }

    /// Drop the cached token so the next request mints a new one
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    async fn fetch_token(&self) -> Result<TokenResponse, DatabaseError> {
        let creds = &self.credentials;
        let now = Utc::now().timestamp();
        let token_uri = creds.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        let claims = GoogleJwtClaims {
            iss: creds.client_email.clone(),
            scope: DATABASE_SCOPES.to_string(),
            aud: token_uri.to_string(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
            .map_err(|e| DatabaseError::Auth(format!("Failed to parse private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DatabaseError::Auth(format!("Failed to encode JWT: {}", e)))?;

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DatabaseError::Auth(format!("Token exchange failed: {}", error_text)));
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!("Got access token for service account {}", creds.client_email);
        Ok(token)
    }
}

fn parse_credentials(json: &str) -> Result<ServiceAccountCredentials, DatabaseError> {
    serde_json::from_str(json)
        .map_err(|e| DatabaseError::Auth(format!("Failed to parse credentials JSON: {}", e)))
}
