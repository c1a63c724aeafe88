use serde::{Deserialize, Serialize};

/// One role/content pair. Serialized into the outbound message list and
/// decoded from inbound choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: Some(content.into()),
        }
    }
}

/// Outbound completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One decoded choice. Plain responses carry the text under `message`,
/// streamed events under `delta`; the alias keeps that variance out of the
/// extraction code.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default, alias = "delta")]
    pub message: Option<ChatMessage>,
}

/// Response envelope, shared by the plain body and each streamed event.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// Concatenates every non-empty choice content in list order, no
    /// separator. Empty string means no content in this envelope.
    pub fn joined_content(&self) -> String {
        let mut out = String::new();
        for choice in &self.choices {
            if let Some(content) = choice.message.as_ref().and_then(|m| m.content.as_deref()) {
                out.push_str(content);
            }
        }
        out
    }
}
