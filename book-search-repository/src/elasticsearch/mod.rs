//! HTTP implementation of the search engine client.
//!
//! Requests go through the `opensearch` crate's transport, which speaks the
//! same REST surface (`/_query`, `/_bulk`, index and cluster APIs) as the
//! backend the books are stored in.

mod client;
mod index_config;
mod queries;

pub use client::ElasticsearchClient;
pub use index_config::get_index_settings;
pub use queries::{
    count_by_year, index_pattern_is_valid, most_published_between, version_query,
    MOST_PUBLISHED_LIMIT,
};
