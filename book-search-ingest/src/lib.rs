//! # Book Search Ingest
//!
//! Streaming conversion of delimited book data into bulk-indexing payloads,
//! and seeding of the search backend with the result.
//!
//! ## Architecture
//!
//! 1. **Source**: Opens the input over HTTP or from a file
//! 2. **Reader**: Parses rows against a [`Schema`] into typed records
//! 3. **Emitter**: Writes action/document line pairs to a sink
//! 4. **Loader**: Submits the payload to the backend and refreshes the index

pub mod converter;
pub mod emitter;
pub mod errors;
pub mod loader;
pub mod reader;
pub mod record;
pub mod schema;
pub mod source;

pub use converter::{convert, convert_in_batches, convert_location, ConversionSummary};
pub use emitter::BulkEmitter;
pub use errors::IngestError;
pub use loader::{LoaderConfig, SeedLoader, SeedSummary, DEFAULT_BATCH_SIZE};
pub use reader::{RecordReader, RowOutcome, SkipReason};
pub use record::{FieldValue, Record};
pub use schema::{Field, FieldType, Schema, SchemaBuilder};
pub use source::{open_location, HttpSource, SourceLocation};
