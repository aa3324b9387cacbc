use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single message inside a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
}

/// Metadata of a file attached to a user message. The bytes themselves never
/// pass through the client core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
    #[serde(rename = "isStreaming", default)]
    pub is_streaming: bool,
}

impl Message {
    pub fn user(content: impl Into<String>, attachments: Vec<AttachmentRef>) -> Self {
        Self {
            id: MessageId::generate(),
            kind: MessageKind::User,
            content: content.into(),
            attachments,
            is_streaming: false,
        }
    }

    /// Finished bot message, e.g. one loaded from thread history
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            kind: MessageKind::Bot,
            content: content.into(),
            attachments: Vec::new(),
            is_streaming: false,
        }
    }

    /// Empty bot message that will be filled by a response stream
    pub fn bot_placeholder() -> Self {
        Self {
            is_streaming: true,
            ..Self::bot(String::new())
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == MessageKind::Bot
    }
}
