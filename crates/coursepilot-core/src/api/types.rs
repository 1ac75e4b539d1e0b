use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One chat turn. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            response_id: None,
            chat_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// Entry of `GET /api/chats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatListItem {
    pub chat_id: String,
    pub title: String,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_messages: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
    #[serde(default)]
    pub response_id: Option<String>,
    pub chat_id: String,
}

impl ChatResponse {
    /// The assistant message stamped with the ids it arrived with.
    pub fn into_message(self) -> Message {
        let mut message = self.message;
        if message.response_id.is_none() {
            message.response_id = self.response_id;
        }
        message.chat_id = Some(self.chat_id);
        message
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// The backend emits RFC 3339 as well as naive ISO timestamps (no offset);
/// the latter are taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), json!("assistant"));
    }

    #[test]
    fn test_message_omits_missing_ids() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value["role"], "user");
        assert!(value.get("response_id").is_none());
        assert!(value.get("chat_id").is_none());
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_message_accepts_naive_timestamp() {
        let msg: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": "Hello",
            "timestamp": "2024-09-01T10:15:30.123456"
        }))
        .unwrap();
        assert_eq!(msg.timestamp.to_rfc3339(), "2024-09-01T10:15:30.123456+00:00");
    }

    #[test]
    fn test_message_without_timestamp_gets_now() {
        let before = Utc::now();
        let msg: Message = serde_json::from_value(json!({"role": "user", "content": "x"})).unwrap();
        assert!(msg.timestamp >= before);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let result: Result<Message, _> = serde_json::from_value(json!({
            "role": "user", "content": "x", "timestamp": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_request_skips_empty_context() {
        let req = ChatRequest {
            message: "What is due this week?".into(),
            chat_id: None,
            previous_messages: Vec::new(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"message": "What is due this week?"}));
    }

    #[test]
    fn test_chat_response_stamps_ids() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "Two essays."},
            "response_id": "resp_1",
            "chat_id": "abc"
        }))
        .unwrap();
        let msg = resp.into_message();
        assert_eq!(msg.response_id.as_deref(), Some("resp_1"));
        assert_eq!(msg.chat_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_chat_response_without_response_id() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "Two essays."},
            "chat_id": "abc"
        }))
        .unwrap();
        assert!(resp.response_id.is_none());
        let msg = resp.into_message();
        assert!(msg.response_id.is_none());
        assert_eq!(msg.chat_id.as_deref(), Some("abc"));
    }
}
