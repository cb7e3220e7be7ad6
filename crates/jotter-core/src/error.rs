//! Error types for the jotter enrichment pipeline.

use thiserror::Error;

/// Shorthand used by every jotter crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while enriching content.
///
/// Per-item variants are counted by the task families; `Config` is fatal
/// at startup; `Cancelled` only unwinds.
#[derive(Error, Debug)]
pub enum Error {
    /// A query or transaction against PostgreSQL failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing note, tag owner or blob object
    #[error("Not found: {0}")]
    NotFound(String),

    /// Model provider call failed or returned an unusable response
    #[error("Model error: {0}")]
    Model(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Payload MIME type is not on the allow-list for the requested operation
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    /// Payload or argument rejected before any external call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or malformed environment at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to an HTTP collaborator
    #[error("Request error: {0}")]
    Request(String),

    /// JSON that could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The run was cancelled while this operation was pending
    #[error("Operation cancelled")]
    Cancelled,

    /// Invariant broken inside the pipeline itself
    #[error("Internal error: {0}")]
    Internal(String),

    /// Local filesystem failure (filesystem blob backend)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the cancellation signal rather than a failure.
    ///
    /// Cancellation unwinds a task loop but is never counted as an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
