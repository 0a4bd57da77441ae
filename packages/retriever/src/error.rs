//! Error types for the retriever.

use thiserror::Error;

/// Main error type for the retriever library.
#[derive(Debug, Error)]
pub enum RetrieverError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// All retry attempts failed on transient errors.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Page was fetched but no usable text survived cleanup.
    #[error("No readable content found at {0}")]
    NoContent(String),
}

/// Result type alias for retriever operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;
