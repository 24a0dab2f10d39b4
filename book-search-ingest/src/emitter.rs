//! Bulk payload emitter.
//!
//! Writes documents as newline-delimited action/document pairs:
//!
//! ```text
//! {"index":{"_index":"books"}}
//! {"title":"Peter Rabbit",...}
//!
//! ```
//!
//! The payload always ends with one extra blank line, including when no
//! documents were written.

use std::io::{BufWriter, Write};

use serde::Serialize;
use serde_json::json;

use crate::errors::IngestError;

const LINE_TERMINATOR: &[u8] = b"\n";

/// Streaming writer of bulk payloads.
///
/// The emitter owns its sink; dropping it without calling
/// [`finish`](BulkEmitter::finish) releases the sink without the trailing
/// blank line.
pub struct BulkEmitter<W: Write> {
    sink: BufWriter<W>,
    action: Vec<u8>,
    emitted: usize,
}

impl<W: Write> BulkEmitter<W> {
    /// Create an emitter targeting `index`. A missing or blank index name
    /// produces the empty action form.
    pub fn new(sink: W, index: Option<&str>) -> Self {
        Self {
            sink: BufWriter::new(sink),
            action: Self::action_line(index).into_bytes(),
            emitted: 0,
        }
    }

    /// Action line for `index`, without terminator.
    pub fn action_line(index: Option<&str>) -> String {
        match index.filter(|name| !name.trim().is_empty()) {
            Some(name) => json!({ "index": { "_index": name } }).to_string(),
            None => json!({ "index": {} }).to_string(),
        }
    }

    /// Write one action/document pair.
    pub fn emit<T: Serialize>(&mut self, document: &T) -> Result<(), IngestError> {
        self.sink.write_all(&self.action).map_err(sink_error)?;
        self.sink.write_all(LINE_TERMINATOR).map_err(sink_error)?;
        serde_json::to_writer(&mut self.sink, document)?;
        self.sink.write_all(LINE_TERMINATOR).map_err(sink_error)?;
        self.emitted += 1;
        Ok(())
    }

    /// Number of pairs written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Write the trailing blank line, flush, and hand back the sink.
    pub fn finish(mut self) -> Result<W, IngestError> {
        self.sink.write_all(LINE_TERMINATOR).map_err(sink_error)?;
        self.sink.flush().map_err(sink_error)?;
        self.sink
            .into_inner()
            .map_err(|e| IngestError::sink(e.error().to_string()))
    }
}

fn sink_error(err: std::io::Error) -> IngestError {
    IngestError::sink(err.to_string())
}
