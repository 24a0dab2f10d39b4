//! Error types for the book search ingest.

use book_search_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while converting or loading data.
///
/// Malformed rows are not errors; the reader reports them as skipped rows.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Reading the source failed: connection error, non-success status or I/O.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Writing to the output sink failed.
    #[error("Sink error: {0}")]
    SinkError(String),

    /// A record could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The schema definition is unusable.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Error from the seed loader.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Error from the search backend.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

impl IngestError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a sink error.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::SinkError(msg.into())
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::SinkError(err.to_string())
        } else {
            Self::SerializationError(err.to_string())
        }
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}
