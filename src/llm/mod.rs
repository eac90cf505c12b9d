// LLM module

pub mod agent;
pub mod client;
pub mod prompts;
pub mod rotation;

pub use agent::{AnalysisInput, ClientImage, KnowledgeAgent};
pub use client::{GeminiClient, Part};
pub use rotation::call_with_rotation;
