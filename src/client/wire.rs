//! Request and response bodies of the conversation endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{new_message_id, Message, Role};

/// Body of `POST /conversations`
#[derive(Debug, Serialize)]
pub(crate) struct CreateConversationRequest<'a> {
    pub title: &'a str,
    pub mode: &'a str,
}

/// Response of `POST /conversations`
#[derive(Debug, Deserialize)]
pub(crate) struct CreateConversationResponse {
    pub conversation: ConversationRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationRef {
    pub id: serde_json::Value,
}

/// Body of `POST /conversations/{id}/messages` and `POST /chat/quick`
#[derive(Debug, Serialize)]
pub(crate) struct MessageRequest<'a> {
    pub message: &'a str,
}

/// Response of `POST /conversations/{id}/messages`
#[derive(Debug, Deserialize)]
pub(crate) struct PostMessageResponse {
    pub assistant_message: WireMessage,
}

/// Response of `POST /chat/quick`
#[derive(Debug, Deserialize)]
pub(crate) struct QuickMessageResponse {
    #[serde(default)]
    pub success: bool,
    pub assistant_message: Option<WireMessage>,
}

/// Assistant message as the backend sends it
///
/// Ids arrive as strings or integers depending on the backend table.
#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Render a JSON id as an opaque string; `None` for null or empty ids
pub(crate) fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl WireMessage {
    pub(crate) fn into_message(self) -> Message {
        Message {
            id: id_to_string(&self.id).unwrap_or_else(new_message_id),
            role: self.role.unwrap_or(Role::Assistant),
            content: self.content,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_becomes_string() {
        let raw = r#"{"id": 17, "role": "assistant", "content": "hi"}"#;
        let message = serde_json::from_str::<WireMessage>(raw).unwrap().into_message();
        assert_eq!(message.id, "17");
        assert_eq!(message.role, Role::Assistant);
    }

    #[test]
    fn test_missing_id_gets_local_id() {
        let raw = r#"{"content": "hi"}"#;
        let message = serde_json::from_str::<WireMessage>(raw).unwrap().into_message();
        assert!(!message.id.is_empty());
        assert_eq!(message.role, Role::Assistant);
    }

    #[test]
    fn test_id_to_string_rejects_null_and_empty() {
        assert_eq!(id_to_string(&serde_json::Value::Null), None);
        assert_eq!(id_to_string(&serde_json::json!("")), None);
        assert_eq!(id_to_string(&serde_json::json!("abc")), Some("abc".into()));
    }
}
