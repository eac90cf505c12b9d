// Routes module

pub mod api_keys;
pub mod chat;
pub mod events;
pub mod health;
pub mod memories;
pub mod settings;

pub use api_keys::api_keys_routes;
pub use chat::chat_routes;
pub use events::events_routes;
pub use health::health_routes;
pub use memories::memories_routes;
pub use settings::settings_routes;
