// Services module

pub mod events;
pub mod google_auth;
pub mod realtime_db;

pub use events::DatabaseEvent;
pub use realtime_db::RealtimeDbService;
