//! Seed loader.
//!
//! Seeds the search backend with converted CSV data: creates the index with
//! its mapping, converts the source into bounded bulk payloads, submits each
//! one as it is produced, and refreshes the index so the documents are
//! immediately searchable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::converter::convert_in_batches;
use crate::errors::IngestError;
use crate::schema::Schema;
use crate::source::{open_location, HttpSource, SourceLocation};
use book_search_repository::{get_index_settings, SearchEngineClient};

/// Default number of records per bulk request.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Payloads converted ahead of the bulk request in flight.
const PENDING_BATCHES: usize = 2;

/// Configuration for the seed loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Target index.
    pub index: String,
    /// Timeout for fetching the source over HTTP. `None` disables it.
    pub fetch_timeout: Option<Duration>,
    /// Records per bulk request.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            index: book_search_shared::BOOKS_INDEX.to_string(),
            fetch_timeout: Some(Duration::from_secs(30)),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counts from one seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub converted: usize,
    pub skipped: usize,
    pub indexed: usize,
    pub failed: usize,
}

/// Loader that seeds the backend from a delimited source.
pub struct SeedLoader {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
}

impl SeedLoader {
    /// Create a loader with the default configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            client,
            config: LoaderConfig::default(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Seed the index from `location`.
    ///
    /// The conversion runs on a blocking thread and hands over one payload of
    /// at most `batch_size` records at a time; each payload is submitted as
    /// its own bulk request while the next one is converted.
    ///
    /// # Returns
    ///
    /// * `Ok(SeedSummary)` - Every payload was submitted and the index
    ///   refreshed; per-document failures are counted in `failed`
    /// * `Err(IngestError)` - Index creation, conversion, a bulk request or
    ///   the refresh failed
    #[instrument(skip(self, schema), fields(index = %self.config.index))]
    pub async fn seed(
        &self,
        location: SourceLocation,
        schema: Schema,
    ) -> Result<SeedSummary, IngestError> {
        let index = self.config.index.clone();
        self.client
            .ensure_index_exists(&index, &get_index_settings())
            .await?;

        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(PENDING_BATCHES);
        let timeout = self.config.fetch_timeout;
        let batch_size = self.config.batch_size;
        let target = index.clone();
        let conversion = tokio::task::spawn_blocking(move || {
            let http = HttpSource::new(timeout)?;
            let source = open_location(&location, &http)?;
            convert_in_batches(source, &schema, Some(&target), batch_size, |payload| {
                tx.blocking_send(payload)
                    .map_err(|_| IngestError::loader("Bulk submission stopped"))
            })
        });

        let mut indexed = 0;
        let mut failed = 0;
        let mut submit_error = None;
        while let Some(payload) = rx.recv().await {
            match self.client.bulk_index(&index, &payload).await {
                Ok(bulk) => {
                    for failure in bulk.failures.iter().take(5) {
                        warn!(position = failure.position, reason = %failure.reason, "Document rejected");
                    }
                    debug!(succeeded = bulk.succeeded, failed = bulk.failed, "Submitted bulk batch");
                    indexed += bulk.succeeded;
                    failed += bulk.failed;
                }
                Err(e) => {
                    submit_error = Some(e);
                    break;
                }
            }
        }
        // Closing the channel stops the conversion after a failed submission.
        drop(rx);

        let conversion = conversion
            .await
            .map_err(|e| IngestError::loader(format!("Conversion task failed: {}", e)))?;
        if let Some(e) = submit_error {
            return Err(e.into());
        }
        let conversion = conversion?;

        self.client.refresh_index(&index).await?;

        let summary = SeedSummary {
            converted: conversion.emitted,
            skipped: conversion.skipped,
            indexed,
            failed,
        };
        info!(
            converted = summary.converted,
            skipped = summary.skipped,
            indexed = summary.indexed,
            failed = summary.failed,
            "Seeding completed"
        );
        Ok(summary)
    }

    /// Check if the backend is healthy.
    pub async fn health_check(&self) -> Result<bool, IngestError> {
        Ok(self.client.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use book_search_repository::{
        BulkFailure, BulkSummary, EsqlRequest, EsqlResponse, SearchError,
    };
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock client recording the calls the loader makes.
    #[derive(Default)]
    struct MockSearchClient {
        calls: Mutex<Vec<String>>,
        payloads: Mutex<Vec<Vec<u8>>>,
        reject_every_other: bool,
        fail_bulk: bool,
    }

    #[async_trait]
    impl SearchEngineClient for MockSearchClient {
        async fn esql_query(&self, _request: &EsqlRequest) -> Result<EsqlResponse, SearchError> {
            Ok(EsqlResponse::default())
        }

        async fn ensure_index_exists(&self, index: &str, settings: &Value) -> Result<(), SearchError> {
            assert!(settings["mappings"]["properties"]["year"].is_object());
            self.calls.lock().unwrap().push(format!("ensure:{}", index));
            Ok(())
        }

        async fn bulk_index(&self, index: &str, payload: &[u8]) -> Result<BulkSummary, SearchError> {
            self.calls.lock().unwrap().push(format!("bulk:{}", index));
            self.payloads.lock().unwrap().push(payload.to_vec());
            if self.fail_bulk {
                return Err(SearchError::bulk_index("cluster unavailable"));
            }

            let documents = payload.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count() / 2;
            let failures: Vec<BulkFailure> = (0..documents)
                .filter(|i| self.reject_every_other && i % 2 == 1)
                .map(|position| BulkFailure {
                    position,
                    reason: "rejected".to_string(),
                })
                .collect();
            Ok(BulkSummary {
                total: documents,
                succeeded: documents - failures.len(),
                failed: failures.len(),
                failures,
            })
        }

        async fn refresh_index(&self, index: &str) -> Result<(), SearchError> {
            self.calls.lock().unwrap().push(format!("refresh:{}", index));
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
    }

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "book-search-{}-{}.csv",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const BOOKS: &str = "title;description;author;year;publisher;ratings\n\
        title;description;author;year;publisher;ratings\n\
        Emma;A novel;Jane Austen;1815;John Murray;4.0\n\
        Broken;row;without;a;year;x\n\
        Peter Rabbit;A tale;Beatrix Potter;1902;Warne;4.5\n";

    #[tokio::test]
    async fn test_seed_runs_steps_in_order() {
        let path = write_fixture("seed-order", BOOKS);
        let client = Arc::new(MockSearchClient::default());
        let loader = SeedLoader::new(client.clone());

        let summary = loader
            .seed(SourceLocation::File(path.clone()), Schema::books())
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            summary,
            SeedSummary {
                converted: 2,
                skipped: 1,
                indexed: 2,
                failed: 0
            }
        );
        assert_eq!(
            *client.calls.lock().unwrap(),
            vec!["ensure:books", "bulk:books", "refresh:books"]
        );

        let payloads = client.payloads.lock().unwrap();
        let payload = String::from_utf8(payloads[0].clone()).unwrap();
        assert!(payload.starts_with("{\"index\":{\"_index\":\"books\"}}\n"));
        assert!(payload.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_seed_counts_rejected_documents() {
        let path = write_fixture("seed-rejected", BOOKS);
        let client = Arc::new(MockSearchClient {
            reject_every_other: true,
            ..Default::default()
        });
        let loader = SeedLoader::with_config(
            client,
            LoaderConfig {
                index: "library".to_string(),
                fetch_timeout: None,
                batch_size: DEFAULT_BATCH_SIZE,
            },
        );

        let summary = loader
            .seed(SourceLocation::File(path.clone()), Schema::books())
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.failed, 1);
    }

    fn many_books(count: usize) -> String {
        let mut csv = String::from("title;description;author;year;publisher;ratings\n");
        for i in 0..count {
            csv.push_str(&format!("Book {};d;Author {};{};p;3.5\n", i, i, 1900 + i));
        }
        csv
    }

    #[tokio::test]
    async fn test_seed_submits_one_bulk_request_per_batch() {
        let path = write_fixture("seed-batches", &many_books(7));
        let client = Arc::new(MockSearchClient::default());
        let loader = SeedLoader::with_config(
            client.clone(),
            LoaderConfig {
                batch_size: 3,
                ..Default::default()
            },
        );

        let summary = loader
            .seed(
                SourceLocation::File(path.clone()),
                Schema::books().with_skip_first_data_row(false),
            )
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.converted, 7);
        assert_eq!(summary.indexed, 7);
        assert_eq!(
            *client.calls.lock().unwrap(),
            vec!["ensure:books", "bulk:books", "bulk:books", "bulk:books", "refresh:books"]
        );

        let documents: Vec<usize> = client
            .payloads
            .lock()
            .unwrap()
            .iter()
            .map(|payload| {
                let text = String::from_utf8(payload.clone()).unwrap();
                assert!(text.ends_with("}\n\n"));
                text.lines().filter(|line| !line.is_empty()).count() / 2
            })
            .collect();
        assert_eq!(documents, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_seed_stops_after_failed_bulk_request() {
        let path = write_fixture("seed-bulk-failure", &many_books(20));
        let client = Arc::new(MockSearchClient {
            fail_bulk: true,
            ..Default::default()
        });
        let loader = SeedLoader::with_config(
            client.clone(),
            LoaderConfig {
                batch_size: 2,
                ..Default::default()
            },
        );

        let result = loader
            .seed(
                SourceLocation::File(path.clone()),
                Schema::books().with_skip_first_data_row(false),
            )
            .await;
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(IngestError::SearchError(SearchError::BulkIndexError(_)))
        ));
        assert_eq!(*client.calls.lock().unwrap(), vec!["ensure:books", "bulk:books"]);
    }

    #[tokio::test]
    async fn test_seed_missing_source_fails_before_bulk() {
        let client = Arc::new(MockSearchClient::default());
        let loader = SeedLoader::new(client.clone());

        let result = loader
            .seed(
                SourceLocation::File(PathBuf::from("/nonexistent/books.csv")),
                Schema::books(),
            )
            .await;

        assert!(matches!(result, Err(IngestError::TransportError(_))));
        assert_eq!(*client.calls.lock().unwrap(), vec!["ensure:books"]);
    }
}
