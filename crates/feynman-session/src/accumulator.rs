use std::collections::HashMap;

use feynman_types::MessageId;

/// Running content buffers for in-flight bot messages, keyed by message id.
///
/// Deltas are appended; earlier text is never rescanned or rewritten.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    buffers: HashMap<MessageId, String>,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty buffer for `id`, discarding any previous one
    pub fn begin(&mut self, id: MessageId) {
        self.buffers.insert(id, String::new());
    }

    /// Append a delta and return the whole buffer, or None for an unknown id
    pub fn push(&mut self, id: &MessageId, delta: &str) -> Option<&str> {
        let buffer = self.buffers.get_mut(id)?;
        buffer.push_str(delta);
        Some(buffer.as_str())
    }

    pub fn content(&self, id: &MessageId) -> Option<&str> {
        self.buffers.get(id).map(String::as_str)
    }

    /// Remove the buffer and hand back its final content
    pub fn take(&mut self, id: &MessageId) -> Option<String> {
        self.buffers.remove(id)
    }

    pub fn is_tracking(&self, id: &MessageId) -> bool {
        self.buffers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
