//! Search engine client trait definition.
//!
//! This module defines the abstract interface for the backend operations the
//! book searcher and the seed loader need.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::{BulkSummary, EsqlRequest, EsqlResponse};

/// Abstract interface for search backend operations.
///
/// Implementations can be swapped for different transports or for an
/// in-memory mock, which is how the searcher's compatibility gate is tested
/// without a running backend.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Execute an ES|QL query and return its tabular result.
    ///
    /// # Arguments
    ///
    /// * `request` - The query text and its positional parameters
    ///
    /// # Returns
    ///
    /// * `Ok(EsqlResponse)` - Columns and rows of the result
    /// * `Err(SearchError)` - If the request fails or the response cannot be parsed
    async fn esql_query(&self, request: &EsqlRequest) -> Result<EsqlResponse, SearchError>;

    /// Ensure the index exists, creating it with `settings` when it is missing.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index
    /// * `settings` - Settings and mappings body used on creation
    async fn ensure_index_exists(&self, index: &str, settings: &Value) -> Result<(), SearchError>;

    /// Submit a newline-delimited bulk payload.
    ///
    /// Action lines inside the payload may name their own index; `index` is
    /// the default target for action lines that do not.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkSummary)` - Per-item outcome counts
    /// * `Err(SearchError::BulkIndexError)` - If the request itself fails
    async fn bulk_index(&self, index: &str, payload: &[u8]) -> Result<BulkSummary, SearchError>;

    /// Refresh the index so recently indexed documents become searchable.
    async fn refresh_index(&self, index: &str) -> Result<(), SearchError>;

    /// Check if the backend is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the cluster is green or yellow
    /// * `Ok(false)` - If the cluster is red
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
