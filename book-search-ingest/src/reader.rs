//! Record reader.
//!
//! Turns a delimited byte stream into typed [`Record`]s, one row at a time.
//! Rows that do not fit the schema are reported as skipped and iteration
//! moves on; only a failure of the underlying stream ends it early.

use std::io::Read;
use std::sync::Arc;

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::debug;

use crate::errors::IngestError;
use crate::record::{FieldValue, Record};
use crate::schema::{Field, FieldType, Schema};

/// Why a row was dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The row could not be split into fields: wrong field count or invalid UTF-8.
    #[error("malformed row: {0}")]
    Malformed(String),
    /// The row has no value for a schema column.
    #[error("missing column {column} for field {field}")]
    MissingColumn { field: String, column: usize },
    /// A value did not convert to its field's type.
    #[error("field {field} value {value:?} is not a valid {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: FieldType,
    },
}

/// Outcome of reading one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(Record),
    Skipped { line: u64, reason: SkipReason },
}

/// Lazy, forward-only reader of typed records.
///
/// The reader owns its source; dropping it releases the source. Once the
/// source fails or is exhausted the iterator stays finished.
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
    fields: Arc<[Field]>,
    row: StringRecord,
    skip_pending: bool,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader over `source` using `schema`.
    ///
    /// Nothing is read until the first call to `next`.
    pub fn new(source: R, schema: &Schema) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(schema.delimiter())
            .has_headers(schema.has_header())
            .flexible(false)
            .from_reader(source);

        Self {
            reader,
            fields: schema.shared_fields(),
            row: StringRecord::new(),
            skip_pending: schema.skip_first_data_row(),
            finished: false,
        }
    }

    /// Only the parsed records; skipped rows are logged and dropped.
    pub fn records(self) -> impl Iterator<Item = Result<Record, IngestError>> {
        self.filter_map(|outcome| match outcome {
            Ok(RowOutcome::Parsed(record)) => Some(Ok(record)),
            Ok(RowOutcome::Skipped { line, reason }) => {
                debug!(line = line, reason = %reason, "Skipping row");
                None
            }
            Err(e) => Some(Err(e)),
        })
    }

    fn parse_row(&self, row: &StringRecord) -> Result<Record, SkipReason> {
        let values = self
            .fields
            .iter()
            .map(|field| {
                let raw = row.get(field.column).ok_or_else(|| SkipReason::MissingColumn {
                    field: field.name.clone(),
                    column: field.column,
                })?;
                FieldValue::parse(raw, field.field_type).ok_or_else(|| SkipReason::InvalidValue {
                    field: field.name.clone(),
                    value: raw.to_string(),
                    expected: field.field_type,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record::new(Arc::clone(&self.fields), values))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<RowOutcome, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let mut row = std::mem::take(&mut self.row);
            let read = self.reader.read_record(&mut row);

            let outcome = match read {
                Ok(false) => {
                    self.finished = true;
                    None
                }
                Ok(true) => {
                    let line = row.position().map(|p| p.line()).unwrap_or(0);
                    Some(match self.parse_row(&row) {
                        Ok(record) => RowOutcome::Parsed(record),
                        Err(reason) => RowOutcome::Skipped { line, reason },
                    })
                }
                Err(e) => match e.kind() {
                    ErrorKind::Io(_) => {
                        self.finished = true;
                        self.row = row;
                        return Some(Err(IngestError::transport(e.to_string())));
                    }
                    ErrorKind::Utf8 { pos, .. } | ErrorKind::UnequalLengths { pos, .. } => {
                        let line = pos.as_ref().map(|p| p.line()).unwrap_or(0);
                        Some(RowOutcome::Skipped {
                            line,
                            reason: SkipReason::Malformed(e.to_string()),
                        })
                    }
                    _ => Some(RowOutcome::Skipped {
                        line: 0,
                        reason: SkipReason::Malformed(e.to_string()),
                    }),
                },
            };
            self.row = row;

            let outcome = outcome?;
            if self.skip_pending {
                // Duplicate human-readable header, whatever it contains
                self.skip_pending = false;
                continue;
            }
            return Some(Ok(outcome));
        }
        None
    }
}
