//! # Book Search Shared
//!
//! Shared types used across the book search crates: the book document that
//! is seeded into the backend and the aggregation rows read back from it.

mod book;
mod most_published;

pub use book::{Book, BOOKS_INDEX};
pub use most_published::{MostPublished, MostPublishedError};
