//! Client error types

use std::time::Duration;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server error (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Push channel transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Push handshake did not finish in time
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
