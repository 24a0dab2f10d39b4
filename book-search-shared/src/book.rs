//! The book document stored in the search backend.

use serde::{Deserialize, Serialize};

/// Default name of the index holding book documents.
pub const BOOKS_INDEX: &str = "books";

/// A book as it is indexed in the search backend.
///
/// Field names match the columns of the books dataset and the index mapping,
/// so a `Book` deserializes directly from an indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub description: String,
    pub author: String,
    pub year: i32,
    pub publisher: String,
    pub ratings: f32,
}

impl Book {
    /// Create a new book.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        publisher: impl Into<String>,
        ratings: f32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            author: author.into(),
            year,
            publisher: publisher.into(),
            ratings,
        }
    }
}
