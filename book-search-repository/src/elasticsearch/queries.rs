//! ES|QL query builders.
//!
//! Index names cannot be bound as parameters in ES|QL, so they are validated
//! and spliced into the query text; all other values are bound with `?`.

use crate::errors::SearchError;
use crate::types::EsqlRequest;

/// Maximum number of authors returned by [`most_published_between`].
pub const MOST_PUBLISHED_LIMIT: usize = 20;

/// Whether `index` can be spliced into a `from` clause as a single pattern.
pub fn index_pattern_is_valid(index: &str) -> bool {
    !index.is_empty()
        && !index
            .chars()
            .any(|c| c.is_whitespace() || c == '|' || c == ',' || c == '"' || c == '`')
}

fn checked_index(index: &str) -> Result<&str, SearchError> {
    if index_pattern_is_valid(index) {
        Ok(index)
    } else {
        Err(SearchError::invalid_query(format!(
            "Invalid index name {:?}",
            index
        )))
    }
}

/// Query reporting the backend's major and minor version.
pub fn version_query() -> EsqlRequest {
    EsqlRequest::new(
        r#"show info
| keep version
| dissect version "%{major}.%{minor}.%{patch}"
| keep major, minor
| limit 1"#,
    )
}

/// Query counting the books published in `year`.
pub fn count_by_year(index: &str, year: i32) -> Result<EsqlRequest, SearchError> {
    let index = checked_index(index)?;
    Ok(EsqlRequest::new(format!(
        "from {}
| where year == ?
| stats published = count(*)
| limit 1000",
        index
    ))
    .param(year))
}

/// Query ranking authors by the span of years they published in, within
/// `[min_year, max_year]`.
///
/// # Returns
///
/// * `Err(SearchError::InvalidQuery)` - If `min_year > max_year` or the index name is invalid
pub fn most_published_between(
    index: &str,
    min_year: i32,
    max_year: i32,
) -> Result<EsqlRequest, SearchError> {
    if min_year > max_year {
        return Err(SearchError::invalid_query(format!(
            "min year {} is after max year {}",
            min_year, max_year
        )));
    }
    let index = checked_index(index)?;

    Ok(EsqlRequest::new(format!(
        "from {}
| where year >= ? and year <= ?
| stats first_published = min(year), last_published = max(year), times = count(*) by author
| eval years_published = last_published - first_published
| sort years_published desc
| drop years_published
| limit {}",
        index, MOST_PUBLISHED_LIMIT
    ))
    .param(min_year)
    .param(max_year))
}
