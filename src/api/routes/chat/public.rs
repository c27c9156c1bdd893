//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::{Chat, Role};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Omitted (or unresolvable) ids create a new conversation.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Optional in the wire format so a missing field maps to the 400
    /// error body instead of a deserialization rejection.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatTranscriptResponse {
    pub id: String,
    pub messages: Vec<TranscriptMessage>,
}

impl From<&Chat> for ChatTranscriptResponse {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id.to_hex(),
            messages: chat
                .messages
                .iter()
                .map(|m| TranscriptMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}
