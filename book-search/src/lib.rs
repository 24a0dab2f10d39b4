//! # Book Search
//!
//! Entry point and configuration for the book search tools: CSV-to-bulk
//! conversion, seeding the backend, and the ES|QL book queries.

pub mod config;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur while configuring or running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Conversion or seeding error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] book_search_ingest::IngestError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] book_search_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
