//! Client error taxonomy
//!
//! Three classes of failure cross the API boundary: transport failures
//! (no response at all), HTTP error statuses, and client-side validation
//! (currently only the advisory upload size check). Everything else is a
//! local bookkeeping error (session persistence, URL construction).

use thiserror::Error;

/// Error type for all SDK operations
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Session expired: {0}")]
    RefreshFailed(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte upload limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The HTTP status code, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
