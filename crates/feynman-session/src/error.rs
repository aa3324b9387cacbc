use feynman_stream::StreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Nothing to send: message is empty and has no attachments")]
    EmptySubmission,

    #[error("A reply is still streaming")]
    AlreadyStreaming,

    #[error("Backend error: {0}")]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
