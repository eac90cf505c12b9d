// Models module

pub mod api_key;
pub mod memory;
pub mod message;
pub mod settings;

pub use api_key::{AddApiKeyRequest, ApiKeyEntry, ApiKeyView, StoredApiKey};
pub use memory::{
    MemoryItem, MemoryKind, UploadFailure, UploadFile, UploadMemoriesRequest,
    UploadMemoriesResponse,
};
pub use message::{
    Attachment, AttachmentKind, ChatImage, ChatMessage, ChatRequest, ChatResponse,
    ChatSessionResponse, MessageSender,
};
pub use settings::{AgentSettings, UpdateSettingsRequest};
