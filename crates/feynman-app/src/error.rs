use thiserror::Error;

use feynman_session::SessionError;
use feynman_stream::StreamError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] StreamError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
