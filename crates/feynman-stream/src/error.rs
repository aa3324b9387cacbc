use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stream read error: {0}")]
    Read(String),

    #[error("Invalid control frame {sentinel}: {reason}")]
    ControlFrame { sentinel: &'static str, reason: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Stream cancelled")]
    Cancelled,
}

impl StreamError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
