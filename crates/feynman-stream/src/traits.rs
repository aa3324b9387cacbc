use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use feynman_types::{ChatMode, LectureTranscript, Message, ThreadSummary};

use crate::error::Result;
use crate::reader::FrameStream;

/// Remote chat backend as seen by the session layer.
///
/// `open_stream` resolves once response headers arrive with a success
/// status; everything after that is delivered through the returned stream.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Submit user text and stream the bot reply
    async fn open_stream(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<FrameStream>;

    /// Recent threads of the signed-in user
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>>;

    /// Stored messages of a thread, normalized
    async fn thread_history(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Fetch the transcript of a lecture recording
    async fn import_lecture(&self, lecture_url: &str) -> Result<LectureTranscript>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub thread_id: String,
    pub message: String,
    pub mode: ChatMode,
    pub model: Option<String>,
}

impl StreamRequest {
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message: message.into(),
            mode: ChatMode::default(),
            model: None,
        }
    }

    pub fn mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Form fields posted to the streaming endpoint
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("message", self.message.as_str()), ("thread_id", self.thread_id.as_str())];
        if let Some(model) = &self.model {
            fields.push(("model", model.as_str()));
        }
        fields
    }
}
