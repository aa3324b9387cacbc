use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

use feynman_stream::{ChatBackend, StreamRequest};
use feynman_types::{
    AttachmentRef, ChatMode, Conversation, ConversationHandle, LectureTranscript, Message,
};

use crate::error::{Result, SessionError};
use crate::reconciler::{Reconciler, StreamReport};
use crate::store::SessionStore;

/// Attachments kept per submission; extras are dropped
pub const MAX_ATTACHMENTS: usize = 5;

const NEW_CHAT_TITLE: &str = "New Chat";
const FILE_UPLOAD_TITLE: &str = "File Upload";
const TITLE_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub mode: ChatMode,
    pub model: Option<String>,
}

struct InFlight {
    conversation: ConversationHandle,
    cancel: CancellationToken,
}

/// Clears the in-flight slot however the submission ends
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<InFlight>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Conversation-level operations the UI calls: submit, select, create,
/// delete, search, cancel. At most one reply streams at a time.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    store: Arc<dyn SessionStore>,
    options: RwLock<ChatOptions>,
    in_flight: Mutex<Option<InFlight>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_options(backend, store, ChatOptions::default())
    }

    pub fn with_options(
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn SessionStore>,
        options: ChatOptions,
    ) -> Self {
        Self {
            backend,
            store,
            options: RwLock::new(options),
            in_flight: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn options(&self) -> ChatOptions {
        self.options.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_mode(&self, mode: ChatMode) {
        self.options.write().unwrap_or_else(PoisonError::into_inner).mode = mode;
    }

    pub fn set_model(&self, model: Option<String>) {
        self.options.write().unwrap_or_else(PoisonError::into_inner).model = model;
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Send user input and stream the reply into the active conversation.
    ///
    /// Transport and stream failures do not return an error: they end up as a
    /// finalized bot message and a `Failed` outcome in the report.
    pub async fn submit(&self, input: &str, mut attachments: Vec<AttachmentRef>) -> Result<StreamReport> {
        if input.trim().is_empty() && attachments.is_empty() {
            return Err(SessionError::EmptySubmission);
        }
        if attachments.len() > MAX_ATTACHMENTS {
            tracing::warn!(
                "Dropping {} attachment(s) over the limit of {}",
                attachments.len() - MAX_ATTACHMENTS,
                MAX_ATTACHMENTS
            );
            attachments.truncate(MAX_ATTACHMENTS);
        }

        let cancel = CancellationToken::new();
        let conversation = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(SessionError::AlreadyStreaming);
            }
            let conversation = self.active_or_create(input, &attachments);
            *slot = Some(InFlight {
                conversation: conversation.handle,
                cancel: cancel.clone(),
            });
            conversation
        };
        let _guard = InFlightGuard { slot: &self.in_flight };

        self.store.update_conversation(conversation.handle, &mut |conv| {
            conv.push_message(Message::user(input, attachments.clone()));
        });
        self.store.set_loading(true);

        let mut reconciler = Reconciler::new(Arc::clone(&self.store), conversation.handle);
        if let Err(e) = reconciler.begin() {
            self.store.set_loading(false);
            return Err(e);
        }

        let options = self.options();
        // The id may have been rebound since the conversation was resolved
        let thread_id = self
            .store
            .get_conversation(conversation.handle)
            .map(|c| c.id)
            .unwrap_or(conversation.id);
        let request = StreamRequest::new(thread_id, input)
            .mode(options.mode)
            .model(options.model);

        let report = match self.backend.open_stream(request, cancel).await {
            Ok(stream) => reconciler.drive(stream).await,
            Err(e) => reconciler.fail(&e),
        };
        Ok(report)
    }

    fn active_or_create(&self, input: &str, attachments: &[AttachmentRef]) -> Conversation {
        if let Some(active) = self.store.active() {
            return active;
        }

        let title = if input.trim().is_empty() && !attachments.is_empty() {
            FILE_UPLOAD_TITLE.to_string()
        } else {
            title_preview(input)
        };
        let conversation = Conversation::new(title);
        tracing::debug!("Created conversation {} for first message", conversation.id);
        self.store.upsert_conversation(conversation.clone());
        self.store.set_active(Some(conversation.handle));
        conversation
    }

    /// Stop the streaming reply; its text so far is kept
    pub fn cancel(&self) -> bool {
        match self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(in_flight) => {
                tracing::info!("Cancelling streaming reply");
                in_flight.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Empty conversation placed at the top of the list and opened
    pub fn new_conversation(&self) -> Conversation {
        let conversation = Conversation::new(NEW_CHAT_TITLE);
        self.store.upsert_conversation(conversation.clone());
        self.store.set_active(Some(conversation.handle));
        conversation
    }

    /// Open a conversation, loading its history if nothing is loaded yet
    pub async fn select_conversation(&self, id: &str) -> Result<Conversation> {
        let conversation = self
            .store
            .find_conversation(id)
            .ok_or_else(|| SessionError::ConversationNotFound(id.to_string()))?;
        self.store.set_active(Some(conversation.handle));

        if !conversation.messages.is_empty() {
            return Ok(conversation);
        }

        let history = match self.backend.thread_history(id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!("Failed to load history of thread {}: {}", id, e);
                Vec::new()
            }
        };

        if !history.is_empty() {
            let mut history = Some(history);
            self.store.update_conversation(conversation.handle, &mut |conv| {
                // a reply may have started while the history was loading
                if conv.messages.is_empty() {
                    if let Some(history) = history.take() {
                        conv.messages = history;
                    }
                }
            });
        }

        self.store
            .get_conversation(conversation.handle)
            .ok_or_else(|| SessionError::ConversationNotFound(id.to_string()))
    }

    /// Remove a conversation, stopping its reply if one is streaming
    pub fn delete_conversation(&self, id: &str) -> Result<Conversation> {
        let removed = self
            .store
            .remove_conversation(id)
            .ok_or_else(|| SessionError::ConversationNotFound(id.to_string()))?;

        let slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(in_flight) = slot.as_ref().filter(|f| f.conversation == removed.handle) {
            tracing::info!("Deleted conversation {} had a streaming reply; cancelling", id);
            in_flight.cancel.cancel();
        }
        Ok(removed)
    }

    /// Refresh the conversation list from the backend.
    ///
    /// Local conversations the server does not know about stay at the top,
    /// followed by the server threads in server order. Conversations already
    /// loaded keep their messages, including a reply that is still streaming.
    pub async fn load_threads(&self) -> Result<usize> {
        let threads = self.backend.list_threads().await?;
        let count = threads.len();
        let total = self.store.merge_threads(threads);

        tracing::info!("Loaded {} threads ({} total conversations)", count, total);
        Ok(count)
    }

    /// Conversations whose title contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let conversations = self.store.snapshot().conversations;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return conversations;
        }
        conversations
            .into_iter()
            .filter(|c| c.title.to_lowercase().contains(&query))
            .collect()
    }

    pub async fn import_lecture(&self, lecture_url: &str) -> Result<LectureTranscript> {
        Ok(self.backend.import_lecture(lecture_url).await?)
    }
}

fn title_preview(input: &str) -> String {
    let input = input.trim();
    let mut chars = input.chars();
    let preview: String = chars.by_ref().take(TITLE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}
