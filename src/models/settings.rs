// Agent persona settings - singleton under `settings`, last write wins

use serde::{Deserialize, Serialize};

/// Free-text persona configuration used when drafting replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentSettings {
    pub role: String,
    pub tone: String,
    pub language: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            role: "Customer Support Specialist".to_string(),
            tone: "Professional yet friendly".to_string(),
            language: "Indonesian (Formal/Casual mix)".to_string(),
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl UpdateSettingsRequest {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.tone.is_none() && self.language.is_none()
    }
}
