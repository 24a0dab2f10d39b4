//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search backend.

use thiserror::Error;

/// Errors that can occur during search backend operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to establish connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// ES|QL query execution failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Bulk indexing operation had failures.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create or refresh the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse response from the search backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The provided query parameters are invalid. Raised before any request is sent.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The backend reported a version this crate does not support.
    #[error("Backend version {major}.{minor} is not compatible, expected {expected}")]
    Incompatible {
        major: i64,
        minor: i64,
        expected: String,
    },

    /// The backend did not report a version at all.
    #[error("No version found")]
    NoVersion,
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Whether this error is a precondition failure that retrying cannot fix.
    pub fn is_compatibility_error(&self) -> bool {
        matches!(self, Self::Incompatible { .. } | Self::NoVersion)
    }
}

impl From<opensearch::Error> for SearchError {
    fn from(err: opensearch::Error) -> Self {
        Self::ConnectionError(err.to_string())
    }
}
