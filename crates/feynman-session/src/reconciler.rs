use futures::StreamExt;
use std::sync::Arc;

use feynman_stream::{FrameStream, StreamError};
use feynman_types::{ConversationHandle, Message, MessageId, StreamEvent};

use crate::accumulator::MessageAccumulator;
use crate::error::{Result, SessionError};
use crate::rename::apply_thread_rename;
use crate::store::SessionStore;

/// Replaces the reply when a request or stream fails
pub const STREAM_ERROR_NOTICE: &str = "Sorry, an error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
    Finalizing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Transport closed normally
    Completed,
    /// Stopped by the user; accumulated text is kept
    Cancelled,
    /// Request or read failure; text replaced by [`STREAM_ERROR_NOTICE`]
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    pub conversation: ConversationHandle,
    pub message_id: MessageId,
    pub outcome: StreamOutcome,
    pub content: String,
    pub events: usize,
}

/// Drives one bot reply from placeholder to its final content.
///
/// Each event is written to the session store before the next one is read,
/// so observers see progress frame by frame. The conversation is addressed
/// by handle, which keeps working if its id is rebound mid-stream.
pub struct Reconciler {
    store: Arc<dyn SessionStore>,
    conversation: ConversationHandle,
    message_id: MessageId,
    accumulator: MessageAccumulator,
    phase: StreamPhase,
    events: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn SessionStore>, conversation: ConversationHandle) -> Self {
        Self {
            store,
            conversation,
            message_id: MessageId::generate(),
            accumulator: MessageAccumulator::new(),
            phase: StreamPhase::Idle,
            events: 0,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn conversation(&self) -> ConversationHandle {
        self.conversation
    }

    /// Append the streaming placeholder to the conversation
    pub fn begin(&mut self) -> Result<()> {
        if self.phase != StreamPhase::Idle {
            return Err(SessionError::AlreadyStreaming);
        }

        let mut placeholder = Message::bot_placeholder();
        placeholder.id = self.message_id.clone();

        let mut busy = false;
        let found = self.store.update_conversation(self.conversation, &mut |conv| {
            busy = conv.streaming_message().is_some();
            if !busy {
                conv.push_message(placeholder.clone());
            }
        });

        if !found {
            return Err(SessionError::ConversationNotFound(format!("{:?}", self.conversation)));
        }
        if busy {
            return Err(SessionError::AlreadyStreaming);
        }

        self.accumulator.begin(self.message_id.clone());
        self.phase = StreamPhase::Streaming;
        tracing::debug!("Streaming reply {}", self.message_id);
        Ok(())
    }

    /// Apply one decoded event. Ignored unless streaming.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.phase != StreamPhase::Streaming {
            tracing::debug!("Dropping event in phase {:?}: {:?}", self.phase, event);
            return;
        }
        self.events += 1;

        match event {
            StreamEvent::Content { delta } => {
                let Some(buffer) = self.accumulator.push(&self.message_id, &delta) else {
                    return;
                };
                let id = &self.message_id;
                // the accumulator is the source of truth for the reply text
                let written = self.store.update_conversation(self.conversation, &mut |conv| {
                    if let Some(msg) = conv.message_mut(id).filter(|m| m.is_streaming) {
                        msg.content.clear();
                        msg.content.push_str(buffer);
                    }
                });
                if !written {
                    tracing::debug!("Conversation for reply {} is gone, buffering only", id);
                }
            }
            StreamEvent::ThreadRename(notice) => {
                apply_thread_rename(self.store.as_ref(), &notice);
            }
            StreamEvent::End => {
                self.phase = StreamPhase::Finalizing;
            }
        }
    }

    /// Consume the stream until it ends, fails or is cancelled
    pub async fn drive(mut self, mut stream: FrameStream) -> StreamReport {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    self.apply(event);
                    if self.phase == StreamPhase::Finalizing {
                        return self.finish(StreamOutcome::Completed);
                    }
                }
                Err(e) => return self.fail(&e),
            }
        }
        self.finish(StreamOutcome::Completed)
    }

    /// Finalize after a request or read error
    pub fn fail(self, error: &StreamError) -> StreamReport {
        if error.is_cancelled() {
            return self.finish(StreamOutcome::Cancelled);
        }
        tracing::error!("Reply {} failed: {}", self.message_id, error);
        self.finish(StreamOutcome::Failed)
    }

    /// Mark the reply finished and clear the loading flag. Terminal.
    pub fn finish(mut self, outcome: StreamOutcome) -> StreamReport {
        self.phase = StreamPhase::Finalizing;

        let accumulated = self.accumulator.take(&self.message_id).unwrap_or_default();
        let content = match outcome {
            StreamOutcome::Failed => STREAM_ERROR_NOTICE.to_string(),
            StreamOutcome::Completed | StreamOutcome::Cancelled => accumulated,
        };

        let id = &self.message_id;
        self.store.update_conversation(self.conversation, &mut |conv| {
            if let Some(msg) = conv.message_mut(id).filter(|m| m.is_streaming) {
                msg.content.clone_from(&content);
                msg.is_streaming = false;
                conv.touch();
            }
        });
        self.store.set_loading(false);
        self.phase = StreamPhase::Done;

        tracing::info!(
            "Reply {} finished: {:?} after {} events ({} bytes)",
            self.message_id,
            outcome,
            self.events,
            content.len()
        );

        StreamReport {
            conversation: self.conversation,
            message_id: self.message_id,
            outcome,
            content,
            events: self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use feynman_types::Conversation;

    fn setup() -> (Arc<InMemorySessionStore>, ConversationHandle) {
        let store = Arc::new(InMemorySessionStore::new());
        let conv = Conversation::with_id("1", "New Chat");
        let handle = conv.handle;
        store.upsert_conversation(conv);
        store.set_active(Some(handle));
        (store, handle)
    }

    #[test]
    fn test_begin_appends_placeholder() {
        let (store, handle) = setup();
        let mut reconciler = Reconciler::new(store.clone(), handle);
        reconciler.begin().unwrap();

        assert_eq!(reconciler.phase(), StreamPhase::Streaming);
        let active = store.active().unwrap();
        let msg = active.streaming_message().unwrap();
        assert_eq!(&msg.id, reconciler.message_id());
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_second_reply_is_refused() {
        let (store, handle) = setup();
        let mut first = Reconciler::new(store.clone(), handle);
        first.begin().unwrap();

        let mut second = Reconciler::new(store.clone(), handle);
        assert!(matches!(second.begin(), Err(SessionError::AlreadyStreaming)));
        assert_eq!(store.active().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_unknown_conversation() {
        let (store, _) = setup();
        let mut reconciler = Reconciler::new(store, ConversationHandle::new());
        assert!(matches!(reconciler.begin(), Err(SessionError::ConversationNotFound(_))));
    }

    #[test]
    fn test_events_after_end_are_dropped() {
        let (store, handle) = setup();
        let mut reconciler = Reconciler::new(store.clone(), handle);
        reconciler.begin().unwrap();

        reconciler.apply(StreamEvent::content("a"));
        reconciler.apply(StreamEvent::End);
        reconciler.apply(StreamEvent::content("b"));

        let report = reconciler.finish(StreamOutcome::Completed);
        assert_eq!(report.content, "a");
        assert_eq!(report.events, 2);
    }

    #[test]
    fn test_stored_text_follows_accumulator() {
        let (store, handle) = setup();
        let mut reconciler = Reconciler::new(store.clone(), handle);
        reconciler.begin().unwrap();
        reconciler.apply(StreamEvent::content("a"));
        reconciler.apply(StreamEvent::content("b"));

        // an outside writer clobbers the stored reply mid-stream
        let id = reconciler.message_id().clone();
        store.update_conversation(handle, &mut |conv| {
            if let Some(msg) = conv.message_mut(&id) {
                msg.content.clear();
            }
        });

        reconciler.apply(StreamEvent::content("c"));
        assert_eq!(store.active().unwrap().messages[0].content, "abc");
    }

    #[test]
    fn test_failure_replaces_partial_content() {
        let (store, handle) = setup();
        store.set_loading(true);
        let mut reconciler = Reconciler::new(store.clone(), handle);
        reconciler.begin().unwrap();
        reconciler.apply(StreamEvent::content("partial"));

        let report = reconciler.fail(&StreamError::Read("reset".to_string()));

        assert_eq!(report.outcome, StreamOutcome::Failed);
        let active = store.active().unwrap();
        assert_eq!(active.messages[0].content, STREAM_ERROR_NOTICE);
        assert!(!active.messages[0].is_streaming);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_cancel_keeps_partial_content() {
        let (store, handle) = setup();
        let mut reconciler = Reconciler::new(store.clone(), handle);
        reconciler.begin().unwrap();
        reconciler.apply(StreamEvent::content("half"));

        let report = reconciler.fail(&StreamError::Cancelled);

        assert_eq!(report.outcome, StreamOutcome::Cancelled);
        assert_eq!(store.active().unwrap().messages[0].content, "half");
    }
}
