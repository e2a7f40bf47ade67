//! Error types for the lichess client.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed event payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// A decode failure concerns one message, not the connection; the
    /// stream is still usable afterwards.
    pub fn is_decode(&self) -> bool {
        matches!(self, ClientError::Decode(_))
    }
}
