//! Index settings and mappings for the books index.

use serde_json::{json, Value};

/// Get the index settings and mappings for the books index.
///
/// Text columns are analyzed `text`; the publication year fits a `short` and
/// ratings are stored as `half_float`, matching the dataset's value ranges.
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": {
                "title": { "type": "text" },
                "description": { "type": "text" },
                "author": { "type": "text" },
                "year": { "type": "short" },
                "publisher": { "type": "text" },
                "ratings": { "type": "half_float" }
            }
        }
    })
}
