//! Conversation data model.
//!
//! A [`Chat`] is an append-only sequence of role-tagged messages stored
//! as a single MongoDB document. Messages are never reordered or
//! deleted; a turn appends a user message and, once the model reply has
//! fully streamed, at most one assistant message.

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of trailing messages sent to the model as context.
pub const CONTEXT_WINDOW: usize = 5;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Persisted document layout:
/// `{_id, messages: [{role, content, timestamp}], createdAt, updatedAt}`.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// A new, not-yet-persisted conversation with an empty transcript.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message in memory. Durability comes from the next
    /// [`TranscriptStore::append_and_save`](crate::chat::TranscriptStore).
    pub fn push(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    /// The trailing [`CONTEXT_WINDOW`] messages, always a suffix of the
    /// transcript.
    pub fn context_window(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(CONTEXT_WINDOW);
        &self.messages[start..]
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn test_role_deserialization() {
        assert_eq!(
            serde_json::from_str::<Role>(r#""user""#).unwrap(),
            Role::User
        );
        assert_eq!(
            serde_json::from_str::<Role>(r#""assistant""#).unwrap(),
            Role::Assistant
        );
        assert!(serde_json::from_str::<Role>(r#""system""#).is_err());
    }

    #[test]
    fn test_new_chat_is_empty() {
        let chat = Chat::new();
        assert!(chat.messages.is_empty());
        assert_eq!(chat.created_at, chat.updated_at);
    }

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut chat = Chat::new();
        chat.push(ChatMessage::new(Role::User, "first"));
        chat.push(ChatMessage::new(Role::Assistant, "second"));
        chat.push(ChatMessage::new(Role::User, "third"));

        let contents: Vec<&str> = chat.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_context_window_short_transcript() {
        let mut chat = Chat::new();
        chat.push(ChatMessage::new(Role::User, "hello"));
        assert_eq!(chat.context_window().len(), 1);

        let empty = Chat::new();
        assert!(empty.context_window().is_empty());
    }

    #[test]
    fn test_context_window_is_trailing_suffix() {
        let mut chat = Chat::new();
        for i in 0..12 {
            chat.push(ChatMessage::new(Role::User, &format!("msg {}", i)));
        }

        let window = chat.context_window();
        assert_eq!(window.len(), CONTEXT_WINDOW);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 7", "msg 8", "msg 9", "msg 10", "msg 11"]);
    }

    #[test]
    fn test_chat_document_layout() {
        let mut chat = Chat::new();
        chat.push(ChatMessage::new(Role::User, "hello"));

        let doc = bson::to_document(&chat).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("updatedAt"));
        let messages = doc.get_array("messages").unwrap();
        assert_eq!(messages.len(), 1);
        let msg = messages[0].as_document().unwrap();
        assert_eq!(msg.get_str("role").unwrap(), "user");
        assert_eq!(msg.get_str("content").unwrap(), "hello");
        assert!(msg.get_datetime("timestamp").is_ok());
    }

    #[test]
    fn test_chat_document_roundtrip() {
        let mut chat = Chat::new();
        chat.push(ChatMessage::new(Role::User, "hello"));
        chat.push(ChatMessage::new(Role::Assistant, "world"));

        let doc = bson::to_document(&chat).unwrap();
        let parsed: Chat = bson::from_document(doc).unwrap();
        assert_eq!(parsed.id, chat.id);
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[1].role, Role::Assistant);
        assert_eq!(parsed.messages[1].content, "world");
    }
}
