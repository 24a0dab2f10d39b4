//! CSV-to-bulk conversion.
//!
//! Pulls one row at a time from the record reader and pushes each parsed
//! record straight to the bulk emitter, so memory use does not grow with the
//! input.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::emitter::BulkEmitter;
use crate::errors::IngestError;
use crate::reader::{RecordReader, RowOutcome};
use crate::schema::Schema;
use crate::source::{open_location, HttpSource, SourceLocation};

/// Counts from one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Records written as action/document pairs.
    pub emitted: usize,
    /// Rows dropped because they did not fit the schema.
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Convert delimited rows from `source` into a bulk payload written to `sink`.
///
/// Both `source` and `sink` are consumed and released before this returns,
/// whether it succeeds or fails. Pass `&mut sink` to keep the sink.
///
/// # Returns
///
/// * `Ok(ConversionSummary)` - The payload, including the trailing blank line, was flushed
/// * `Err(IngestError::TransportError)` - Reading the source failed
/// * `Err(IngestError::SinkError)` - Writing or flushing the sink failed
pub fn convert<R: Read, W: Write>(
    source: R,
    sink: W,
    schema: &Schema,
    index: Option<&str>,
) -> Result<ConversionSummary, IngestError> {
    let started = Instant::now();
    info!(index = index.unwrap_or(""), "Starting data conversion");

    let reader = RecordReader::new(source, schema);
    let mut emitter = BulkEmitter::new(sink, index);
    let mut skipped = 0;

    for outcome in reader {
        match outcome? {
            RowOutcome::Parsed(record) => emitter.emit(&record)?,
            RowOutcome::Skipped { line, reason } => {
                debug!(line = line, reason = %reason, "Skipping malformed row");
                skipped += 1;
            }
        }
    }

    let emitted = emitter.emitted();
    emitter.finish()?;

    let summary = ConversionSummary {
        emitted,
        skipped,
        elapsed: started.elapsed(),
    };
    info!(
        emitted = summary.emitted,
        skipped = summary.skipped,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Finished data conversion"
    );
    Ok(summary)
}

/// Convert delimited rows from `source` into a series of bulk payloads of at
/// most `batch_size` records each, handing every payload to `on_batch` as soon
/// as it is full.
///
/// Each payload is complete on its own, trailing blank line included. Only
/// one batch is held in memory at a time. No payload is produced for an
/// input without records. A `batch_size` of zero is treated as one.
///
/// # Returns
///
/// * `Ok(ConversionSummary)` - Every batch was handed off
/// * `Err(IngestError)` - Reading the source failed, or `on_batch` failed
pub fn convert_in_batches<R, F>(
    source: R,
    schema: &Schema,
    index: Option<&str>,
    batch_size: usize,
    mut on_batch: F,
) -> Result<ConversionSummary, IngestError>
where
    R: Read,
    F: FnMut(Vec<u8>) -> Result<(), IngestError>,
{
    let started = Instant::now();
    let batch_size = batch_size.max(1);
    info!(index = index.unwrap_or(""), batch_size, "Starting batched data conversion");

    let reader = RecordReader::new(source, schema);
    let mut emitter = BulkEmitter::new(Vec::new(), index);
    let mut emitted = 0;
    let mut skipped = 0;
    let mut batches = 0;

    for outcome in reader {
        match outcome? {
            RowOutcome::Parsed(record) => emitter.emit(&record)?,
            RowOutcome::Skipped { line, reason } => {
                debug!(line = line, reason = %reason, "Skipping malformed row");
                skipped += 1;
            }
        }

        if emitter.emitted() == batch_size {
            let full = std::mem::replace(&mut emitter, BulkEmitter::new(Vec::new(), index));
            emitted += full.emitted();
            batches += 1;
            on_batch(full.finish()?)?;
        }
    }

    if emitter.emitted() > 0 {
        emitted += emitter.emitted();
        batches += 1;
        on_batch(emitter.finish()?)?;
    }

    let summary = ConversionSummary {
        emitted,
        skipped,
        elapsed: started.elapsed(),
    };
    info!(
        emitted = summary.emitted,
        skipped = summary.skipped,
        batches,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Finished batched data conversion"
    );
    Ok(summary)
}

/// Open `location` and convert it. Blocking; see [`HttpSource`].
pub fn convert_location<W: Write>(
    location: &SourceLocation,
    http: &HttpSource,
    sink: W,
    schema: &Schema,
    index: Option<&str>,
) -> Result<ConversionSummary, IngestError> {
    let source = open_location(location, http)?;
    convert(source, sink, schema, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_search_shared::Book;
    use serde_json::{json, Value};
    use std::io::Cursor;

    const HEADER: &str = "title;description;author;year;publisher;ratings\n";

    fn run(input: &str, schema: &Schema, index: Option<&str>) -> (String, ConversionSummary) {
        let mut output = Vec::new();
        let summary = convert(Cursor::new(input.to_string()), &mut output, schema, index).unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn test_single_book_scenario() {
        let input = format!(
            "{}Peter Rabbit;The tale of a naughty rabbit;Beatrix Potter;1902;Warne;4.5\n",
            HEADER
        );
        let schema = Schema::books().with_skip_first_data_row(false);

        let (output, summary) = run(&input, &schema, Some("books"));

        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.skipped, 0);
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"index":{"_index":"books"}}"#);
        assert_eq!(
            serde_json::from_str::<Value>(lines[1]).unwrap(),
            json!({
                "title": "Peter Rabbit",
                "description": "The tale of a naughty rabbit",
                "author": "Beatrix Potter",
                "year": 1902,
                "publisher": "Warne",
                "ratings": 4.5
            })
        );
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "");
        assert!(output.ends_with("}\n\n"));
    }

    #[test]
    fn test_document_keys_follow_schema_order() {
        let input = format!("{}T;D;A;2000;P;3.5\n", HEADER);
        let schema = Schema::books().with_skip_first_data_row(false);

        let (output, _) = run(&input, &schema, None);

        assert_eq!(
            output.lines().nth(1).unwrap(),
            r#"{"title":"T","description":"D","author":"A","year":2000,"publisher":"P","ratings":3.5}"#
        );
    }

    #[test]
    fn test_bad_year_row_is_dropped_and_next_row_survives() {
        let input = format!(
            "{}Bad;d;Someone;eighteen-ten;p;3.0\nGood;d;Someone;1810;p;3.0\n",
            HEADER
        );
        let schema = Schema::books().with_skip_first_data_row(false);

        let (output, summary) = run(&input, &schema, Some("books"));

        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.skipped, 1);
        assert!(output.contains(r#""title":"Good""#));
        assert!(!output.contains(r#""title":"Bad""#));
    }

    #[test]
    fn test_one_pair_per_row_in_order_around_malformed_rows() {
        let input = format!(
            "{}{}broken\nA;d;x;1;p;1.0\nB;d;x;2;p;oops\nC;d;x;3;p;3.0\nD;d;x;4;p;4.0\nlast;broken;row\n",
            HEADER, HEADER
        );

        let (output, summary) = run(&input, &Schema::books(), Some("books"));

        assert_eq!(summary.emitted, 3);
        assert_eq!(summary.skipped, 3);
        let documents: Vec<Value> = output
            .lines()
            .skip(1)
            .step_by(2)
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let titles: Vec<&str> = documents.iter().map(|d| d["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["A", "C", "D"]);
        assert!(output.ends_with("\n\n"));
        assert!(!output.ends_with("\n\n\n"));
    }

    #[test]
    fn test_empty_input_emits_only_blank_line() {
        let (output, summary) = run(HEADER, &Schema::books(), Some("books"));
        assert_eq!(output, "\n");
        assert_eq!(summary.emitted, 0);

        let (output, _) = run("", &Schema::books(), None);
        assert_eq!(output, "\n");
    }

    #[test]
    fn test_round_trip_values() {
        let input = format!("{}Odd \"quotes\";multi word;Au Thor;-44;Pub;0.25\n", HEADER);
        let schema = Schema::books().with_skip_first_data_row(false);

        let (output, _) = run(&input, &schema, None);
        let doc: Value = serde_json::from_str(output.lines().nth(1).unwrap()).unwrap();

        assert_eq!(doc["title"], "Odd \"quotes\"");
        assert_eq!(doc["year"].as_i64(), Some(-44));
        assert_eq!(doc["ratings"].as_f64(), Some(0.25));
    }

    #[test]
    fn test_documents_deserialize_as_books() {
        let input = format!(
            "{}Emma;A novel;Jane Austen;1815;John Murray;4.0\nPersuasion;Another;Jane Austen;1817;John Murray;4.5\n",
            HEADER
        );
        let schema = Schema::books().with_skip_first_data_row(false);

        let (output, _) = run(&input, &schema, Some("books"));
        let books: Vec<Book> = output
            .lines()
            .skip(1)
            .step_by(2)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(
            books,
            vec![
                Book::new("Emma", "A novel", "Jane Austen", 1815, "John Murray", 4.0),
                Book::new("Persuasion", "Another", "Jane Austen", 1817, "John Murray", 4.5),
            ]
        );
    }

    fn batches(input: &str, batch_size: usize) -> (Vec<String>, ConversionSummary) {
        let mut payloads = Vec::new();
        let schema = Schema::books().with_skip_first_data_row(false);
        let summary = convert_in_batches(
            Cursor::new(input.to_string()),
            &schema,
            Some("books"),
            batch_size,
            |payload| {
                payloads.push(String::from_utf8(payload).unwrap());
                Ok(())
            },
        )
        .unwrap();
        (payloads, summary)
    }

    #[test]
    fn test_batches_split_records_in_order() {
        let input = format!(
            "{}A;d;x;1;p;1.0\nB;d;x;2;p;1.0\nbroken\nC;d;x;3;p;1.0\nD;d;x;4;p;1.0\nE;d;x;5;p;1.0\n",
            HEADER
        );
        let (payloads, summary) = batches(&input, 2);

        assert_eq!(payloads.len(), 3);
        assert_eq!(summary.emitted, 5);
        assert_eq!(summary.skipped, 1);

        let titles: Vec<Vec<String>> = payloads
            .iter()
            .map(|payload| {
                assert!(payload.ends_with("}\n\n"));
                payload
                    .lines()
                    .skip(1)
                    .step_by(2)
                    .filter(|line| !line.is_empty())
                    .map(|line| serde_json::from_str::<Value>(line).unwrap()["title"].as_str().unwrap().to_string())
                    .collect()
            })
            .collect();
        assert_eq!(titles, vec![vec!["A", "B"], vec!["C", "D"], vec!["E"]]);
    }

    #[test]
    fn test_batches_without_records_produce_no_payload() {
        let (payloads, summary) = batches(&format!("{}bad;row\n", HEADER), 10);
        assert!(payloads.is_empty());
        assert_eq!(summary.emitted, 0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_batch_handler_failure_stops_conversion() {
        let input = format!("{}A;d;x;1;p;1.0\nB;d;x;2;p;1.0\n", HEADER);
        let mut calls = 0;
        let result = convert_in_batches(
            Cursor::new(input),
            &Schema::books().with_skip_first_data_row(false),
            None,
            1,
            |_| {
                calls += 1;
                Err(IngestError::loader("stopped"))
            },
        );

        assert!(matches!(result, Err(IngestError::LoaderError(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_convert_location_from_file() {
        let path = std::env::temp_dir().join(format!(
            "book-search-convert-{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, format!("{}{}A;d;x;1;p;1.0\n", HEADER, HEADER)).unwrap();

        let http = HttpSource::new(None).unwrap();
        let mut output = Vec::new();
        let summary = convert_location(
            &SourceLocation::File(path.clone()),
            &http,
            &mut output,
            &Schema::books(),
            Some("books"),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.emitted, 1);
        assert_eq!(output.iter().filter(|b| **b == b'\n').count(), 3);
    }
}
