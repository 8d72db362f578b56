//! LLM error types

use thiserror::Error;

/// Errors that can occur while talking to the chat-completion API
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for LlmError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => LlmError::Api {
                status,
                message: "request rejected".to_string(),
            },
            ureq::Error::Io(io) => LlmError::Io(io),
            other => LlmError::Network(other.to_string()),
        }
    }
}
