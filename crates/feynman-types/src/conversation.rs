use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::message::{Message, MessageId};

/// Stable internal identity of a conversation.
///
/// The visible `id` of a conversation may start out client-generated and be
/// replaced later by a server-issued thread id. Anything that needs to keep
/// pointing at the same conversation across that rebinding holds the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationHandle(uuid::Uuid);

impl ConversationHandle {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConversationHandle {
    fn default() -> Self {
        Self::new()
    }
}

static LAST_THREAD_ID: AtomicI64 = AtomicI64::new(0);

/// Timestamp-derived thread id for conversations the server has not seen yet.
///
/// Strictly increasing within the process, so two conversations created in
/// the same millisecond still get distinct ids.
pub fn client_thread_id() -> String {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_THREAD_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or(now);
    now.max(previous + 1).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(skip)]
    pub handle: ConversationHandle,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// New local conversation with a client-generated id
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(client_thread_id(), title)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            handle: ConversationHandle::new(),
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// The bot message currently being filled, if any
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming)
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
