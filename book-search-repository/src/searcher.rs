//! Book queries over the search backend.
//!
//! `BookSearcher` is the application-facing façade: it refuses to be built
//! against an unsupported backend and maps ES|QL results into typed rows.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::elasticsearch::{count_by_year, index_pattern_is_valid, most_published_between, version_query};
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::version::BackendVersion;
use book_search_shared::{MostPublished, BOOKS_INDEX};

/// Runs book queries against a backend that passed the compatibility gate.
pub struct BookSearcher {
    client: Arc<dyn SearchEngineClient>,
    index: String,
    version: BackendVersion,
}

impl BookSearcher {
    /// Create a searcher over the default `books` index.
    ///
    /// Runs the version query first and fails if the backend is not the
    /// supported major/minor release.
    ///
    /// # Returns
    ///
    /// * `Ok(BookSearcher)` - The backend is compatible
    /// * `Err(SearchError::NoVersion)` - The backend reported no version row
    /// * `Err(SearchError::Incompatible)` - The backend version is not supported
    /// * `Err(SearchError)` - The version query itself failed
    pub async fn new(client: Arc<dyn SearchEngineClient>) -> Result<Self, SearchError> {
        let version = Self::check_compatibility(client.as_ref()).await?;
        Ok(Self {
            client,
            index: BOOKS_INDEX.to_string(),
            version,
        })
    }

    /// Target another index. The name must be a single index pattern.
    pub fn with_index(mut self, index: impl Into<String>) -> Result<Self, SearchError> {
        let index = index.into();
        if !index_pattern_is_valid(&index) {
            return Err(SearchError::invalid_query(format!(
                "Invalid index name {:?}",
                index
            )));
        }
        self.index = index;
        Ok(self)
    }

    /// Index the queries run against.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Version the backend reported when the searcher was created.
    pub fn backend_version(&self) -> BackendVersion {
        self.version
    }

    /// Run the compatibility gate without building a searcher.
    pub async fn check_compatibility(
        client: &dyn SearchEngineClient,
    ) -> Result<BackendVersion, SearchError> {
        let response = client.esql_query(&version_query()).await?;
        let version = BackendVersion::from_response(&response)?;
        version.ensure_supported()?;

        info!(version = %version, "Backend version is compatible");
        Ok(version)
    }

    /// Number of books published in `year`.
    #[instrument(skip(self))]
    pub async fn books_published_in_year(&self, year: i32) -> Result<u64, SearchError> {
        let request = count_by_year(&self.index, year)?;
        let response = self.client.esql_query(&request).await?;

        if response.is_empty() {
            return Ok(0);
        }

        let published = response.integer_by_name(0, "published")?;
        u64::try_from(published)
            .map_err(|_| SearchError::parse(format!("Negative count {}", published)))
    }

    /// Authors who published over the longest span of years within
    /// `[min_year, max_year]`, longest span first, at most twenty.
    ///
    /// Authors with equal spans keep the order the backend returned them in.
    ///
    /// # Returns
    ///
    /// * `Err(SearchError::InvalidQuery)` - If `min_year > max_year`; no request is sent
    #[instrument(skip(self))]
    pub async fn most_published_authors(
        &self,
        min_year: i32,
        max_year: i32,
    ) -> Result<Vec<MostPublished>, SearchError> {
        let request = most_published_between(&self.index, min_year, max_year)?;
        let response = self.client.esql_query(&request).await?;

        let rows: Vec<MostPublished> = response.into_objects()?;
        for row in &rows {
            row.validate()
                .map_err(|e| SearchError::parse(format!("Invalid row for {:?}: {}", row.author, e)))?;
        }

        debug!(count = rows.len(), "Most published authors fetched");
        Ok(rows)
    }
}
