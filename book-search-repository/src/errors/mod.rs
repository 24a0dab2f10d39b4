//! Error types for the book search repository.

mod search_error;

pub use search_error::SearchError;
