use serde::{Deserialize, Serialize};

/// Side-channel notice that the backend named (or renamed) a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRenameNotice {
    pub thread_id: String,
    pub thread_name: String,
}

/// One decoded event from a chat response stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text fragment to append to the streaming bot message (may be empty)
    Content { delta: String },

    /// Control frame carrying a thread title
    ThreadRename(ThreadRenameNotice),

    /// Transport closed normally
    End,
}

impl StreamEvent {
    pub fn content(delta: impl Into<String>) -> Self {
        StreamEvent::Content { delta: delta.into() }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StreamEvent::End)
    }
}
