// Knowledge agent - content analysis and reply drafting on top of the
// Gemini client, each call routed through credential rotation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::LlmError;
use crate::llm::client::{GeminiClient, Part};
use crate::llm::prompts::{
    agent_system_prompt, analyze_text_prompt, client_image_prompt, client_message_prompt,
    ANALYZE_FILE_PROMPT, NO_ANALYSIS_FALLBACK, NO_REPLY_FALLBACK,
};
use crate::llm::rotation::call_with_rotation;
use crate::models::{AgentSettings, ApiKeyEntry, MemoryItem, MemoryKind};

/// Content handed to the analyzer
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput<'a> {
    /// Plain text, embedded in the prompt
    Text(&'a str),
    /// Base64 image or document, sent inline
    Inline { kind: MemoryKind, data: &'a str, mime_type: Option<&'a str> },
}

/// Client image attached to a chat message
#[derive(Debug, Clone, Copy)]
pub struct ClientImage<'a> {
    pub data: &'a str,
    pub mime_type: Option<&'a str>,
}

pub struct KnowledgeAgent {
    client: GeminiClient,
    fallback_key: Option<String>,
}

impl KnowledgeAgent {
    pub fn new(client: GeminiClient, fallback_key: Option<String>) -> Self {
        Self { client, fallback_key }
    }

    async fn generate(&self, keys: &[ApiKeyEntry], parts: Vec<Part>) -> Result<Option<String>, LlmError> {
        call_with_rotation(keys, self.fallback_key.as_deref(), |key| {
            let client = self.client.clone();
            let parts = parts.clone();
            async move { client.generate_content(&key, &parts).await }
        })
        .await
    }

    /// Summarize an upload for the knowledge base
    pub async fn analyze_content(
        &self,
        input: AnalysisInput<'_>,
        keys: &[ApiKeyEntry],
    ) -> Result<String, LlmError> {
        let parts = analysis_parts(&input);
        let summary = self.generate(keys, parts).await?;
        Ok(summary.unwrap_or_else(|| NO_ANALYSIS_FALLBACK.to_string()))
    }

    /// Draft a reply to a client message grounded in the knowledge base
    pub async fn generate_agent_response(
        &self,
        client_input: &str,
        client_image: Option<ClientImage<'_>>,
        memories: &[MemoryItem],
        settings: &AgentSettings,
        keys: &[ApiKeyEntry],
    ) -> Result<String, LlmError> {
        let parts = response_parts(client_input, client_image, memories, settings);
        let reply = self.generate(keys, parts).await?;
        Ok(reply.unwrap_or_else(|| NO_REPLY_FALLBACK.to_string()))
    }
}

pub fn analysis_parts(input: &AnalysisInput<'_>) -> Vec<Part> {
    match input {
        AnalysisInput::Text(content) => vec![Part::text(analyze_text_prompt(content))],
        AnalysisInput::Inline { kind, data, mime_type } => {
            let mime = mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| kind.default_mime());
            vec![Part::inline(mime, *data), Part::text(ANALYZE_FILE_PROMPT)]
        }
    }
}

pub fn response_parts(
    client_input: &str,
    client_image: Option<ClientImage<'_>>,
    memories: &[MemoryItem],
    settings: &AgentSettings,
) -> Vec<Part> {
    let mut parts = vec![Part::text(agent_system_prompt(settings, memories))];

    match client_image {
        Some(image) => {
            let mime = image
                .mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("image/png");
            parts.push(Part::inline(mime, image.data));
            parts.push(Part::text(client_image_prompt(client_input)));
        }
        None => parts.push(Part::text(client_message_prompt(client_input))),
    }

    parts
}

/// Decode a base64 text upload for prompting (lossy UTF-8)
pub fn decode_text_upload(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = BASE64.decode(data.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
