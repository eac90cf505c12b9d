// Nexus Agent Backend - knowledge base + reply drafting over Firebase and Gemini

pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use error::DatabaseError;
use llm::{GeminiClient, KnowledgeAgent};
use routes::{
    api_keys_routes, chat_routes, events_routes, health_routes, memories_routes, settings_routes,
};
use services::RealtimeDbService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RealtimeDbService>,
    pub agent: Arc<KnowledgeAgent>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: RealtimeDbService, agent: KnowledgeAgent, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            agent: Arc::new(agent),
            config: Arc::new(config),
        }
    }

    /// Wire the database and Gemini clients from configuration
    pub fn from_config(config: Config) -> Result<Self, DatabaseError> {
        let db = RealtimeDbService::from_config(&config)?;
        let gemini = GeminiClient::new(
            reqwest::Client::new(),
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
        );
        let agent = KnowledgeAgent::new(gemini, config.gemini_api_key.clone());
        Ok(Self::new(db, agent, config))
    }
}

/// Build the full router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes())
        .merge(memories_routes())
        .merge(settings_routes())
        .merge(api_keys_routes())
        .merge(chat_routes())
        .merge(events_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
