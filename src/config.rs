// Configuration - Environment variables
// Loaded once at startup (optionally from .env)

use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LOG_FILE: &str = "/tmp/nexus-agent.log";

/// Application configuration loaded from environment
#[derive(Clone, Debug)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Realtime Database root, e.g. https://<project>-default-rtdb.<region>.firebasedatabase.app
    pub firebase_database_url: Option<String>,
    /// Legacy database secret, sent as the `auth` query parameter
    pub firebase_database_secret: Option<String>,
    /// Service account JSON used to mint OAuth2 access tokens for the database
    pub google_application_credentials: Option<String>,
    /// Fallback Gemini key, used only when the key store is empty
    pub gemini_api_key: Option<String>,
    /// Gemini model used for analysis and replies
    pub gemini_model: String,
    /// Gemini REST endpoint root
    pub gemini_base_url: String,
    /// Log file path (appended to, alongside stdout)
    pub log_file: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            firebase_database_url: non_empty_var("FIREBASE_DATABASE_URL"),
            firebase_database_secret: non_empty_var("FIREBASE_DATABASE_SECRET"),
            google_application_credentials: non_empty_var("GOOGLE_APPLICATION_CREDENTIALS"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            log_file: non_empty_var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        }
    }

    /// Validate that required configuration is present
    pub fn validate(&self) -> Result<(), String> {
        match self.firebase_database_url.as_deref() {
            None => return Err("FIREBASE_DATABASE_URL is not set".to_string()),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                return Err(format!("FIREBASE_DATABASE_URL must be an http(s) URL, got {}", url));
            }
            _ => {}
        }
        if self.firebase_database_secret.is_none() && self.google_application_credentials.is_none() {
            tracing::warn!(
                "Neither FIREBASE_DATABASE_SECRET nor GOOGLE_APPLICATION_CREDENTIALS set - database requests are unauthenticated"
            );
        }
        if self.gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set - inference fails while the key store is empty");
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> Config {
        Config {
            port: 8080,
            firebase_database_url: url.map(str::to_string),
            firebase_database_secret: None,
            google_application_credentials: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }

    #[test]
    fn test_validate_requires_database_url() {
        assert!(config(None).validate().is_err());
        assert!(config(Some("ftp://example.com")).validate().is_err());
        assert!(config(Some("https://demo-default-rtdb.firebaseio.com")).validate().is_ok());
    }
}
