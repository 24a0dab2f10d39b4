//! Aggregated publication span for a single author.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the "most published authors" aggregation.
///
/// Rows are only valid when the author is present, the first publication
/// year is not after the last one, and at least one book was counted. Use
/// [`MostPublished::validate`] after deserializing untrusted rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostPublished {
    pub author: String,
    pub first_published: i32,
    pub last_published: i32,
    pub times: u64,
}

/// Reasons a [`MostPublished`] row is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MostPublishedError {
    #[error("author is missing")]
    MissingAuthor,

    #[error("first_published {first} is after last_published {last}")]
    InvertedSpan { first: i32, last: i32 },

    #[error("times must be greater than zero")]
    ZeroCount,
}

impl MostPublished {
    /// Create a row, rejecting values that cannot come from the aggregation.
    pub fn new(
        author: impl Into<String>,
        first_published: i32,
        last_published: i32,
        times: u64,
    ) -> Result<Self, MostPublishedError> {
        let row = Self {
            author: author.into(),
            first_published,
            last_published,
            times,
        };
        row.validate()?;
        Ok(row)
    }

    /// Check the row invariants.
    pub fn validate(&self) -> Result<(), MostPublishedError> {
        if self.author.is_empty() {
            return Err(MostPublishedError::MissingAuthor);
        }
        if self.first_published > self.last_published {
            return Err(MostPublishedError::InvertedSpan {
                first: self.first_published,
                last: self.last_published,
            });
        }
        if self.times == 0 {
            return Err(MostPublishedError::ZeroCount);
        }
        Ok(())
    }

    /// Number of years between the first and last publication.
    pub fn years_published(&self) -> i32 {
        self.last_published - self.first_published
    }
}
