//! # Book Search Repository
//!
//! This crate provides the trait and HTTP implementation for talking to the
//! search backend, the ES|QL request/response types, and the `BookSearcher`
//! query façade guarded by the backend compatibility gate.

pub mod config;
pub mod elasticsearch;
pub mod errors;
pub mod interfaces;
pub mod searcher;
pub mod types;
pub mod version;

pub use config::{ClientConfig, DEFAULT_URL};
pub use elasticsearch::{get_index_settings, ElasticsearchClient};
pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use searcher::BookSearcher;
pub use types::{BulkFailure, BulkSummary, EsqlColumn, EsqlParam, EsqlRequest, EsqlResponse};
pub use version::BackendVersion;
