// Prompts for knowledge base analysis and reply drafting

use crate::models::{AgentSettings, MemoryItem};

pub const ANALYZE_TEXT_PROMPT: &str =
    "Analyze, interpret, and summarize this text comprehensively for a knowledge base:\n\n";

pub const ANALYZE_FILE_PROMPT: &str = "Analyze this document/image. Extract text and key details to build a usable knowledge base entry for an AI agent.";

pub const NO_ANALYSIS_FALLBACK: &str = "No analysis generated.";

pub const NO_REPLY_FALLBACK: &str = "I couldn't generate a response.";

/// Memories rendered as "[Memory: name]\nsummary" blocks separated by blank lines
pub fn format_knowledge_base(memories: &[MemoryItem]) -> String {
    memories
        .iter()
        .map(|m| format!("[Memory: {}]\n{}", m.name, m.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Settings and memories are embedded verbatim; their text is never re-scanned
/// for placeholders
pub fn agent_system_prompt(settings: &AgentSettings, memories: &[MemoryItem]) -> String {
    format!(
        r#"You are an expert AI Agent:
Role: {role}
Tone: {tone}
Language: {language}

GOAL: Draft a perfect WhatsApp reply using ONLY the Knowledge Base below.

KNOWLEDGE BASE:
{knowledge_base}

INSTRUCTIONS:
- Concise, friendly, use emojis.
- If unknown, ask for clarification.
"#,
        role = settings.role,
        tone = settings.tone,
        language = settings.language,
        knowledge_base = format_knowledge_base(memories),
    )
}

pub fn analyze_text_prompt(content: &str) -> String {
    format!("{}{}", ANALYZE_TEXT_PROMPT, content)
}

pub fn client_message_prompt(message: &str) -> String {
    format!("Client Message: \"{}\"", message)
}

pub fn client_image_prompt(caption: &str) -> String {
    format!(
        "Analyze the client's image and caption: \"{}\" and reply accordingly.",
        caption
    )
}

pub fn welcome_message(role: &str, memory_count: usize) -> String {
    format!(
        "Hello! I am your {}. Send me a client message and I will analyze it using {} memories via Gemini 2.5 Flash.",
        role, memory_count
    )
}
