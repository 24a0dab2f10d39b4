//! Request and response types for ES|QL queries and bulk indexing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SearchError;

/// A positional parameter bound to a `?` placeholder in an ES|QL query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EsqlParam {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i32> for EsqlParam {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for EsqlParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for EsqlParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for EsqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EsqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for EsqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Body of a `POST /_query` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<EsqlParam>,
}

impl EsqlRequest {
    /// Create a request without parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn param(mut self, param: impl Into<EsqlParam>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// A column descriptor in an ES|QL response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl EsqlColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Tabular result of an ES|QL query.
///
/// Rows are stored as they arrive: one JSON array per row, cells in column
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsqlResponse {
    #[serde(default)]
    pub columns: Vec<EsqlColumn>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl EsqlResponse {
    pub fn new(columns: Vec<EsqlColumn>, values: Vec<Vec<Value>>) -> Self {
        Self { columns, values }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Read an integer cell by row and zero-based column position.
    ///
    /// Numeric strings are accepted, since columns produced by `dissect` are
    /// keywords even when they hold digits.
    pub fn integer_at(&self, row: usize, column: usize) -> Result<i64, SearchError> {
        let cell = self
            .values
            .get(row)
            .and_then(|r| r.get(column))
            .ok_or_else(|| {
                SearchError::parse(format!("No cell at row {} column {}", row, column))
            })?;

        match cell {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| SearchError::parse(format!("Cell {} is not an integer", n))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| SearchError::parse(format!("Cell {:?} is not an integer: {}", s, e))),
            other => Err(SearchError::parse(format!(
                "Cell {} is not an integer",
                other
            ))),
        }
    }

    /// Read an integer cell by row and column name.
    pub fn integer_by_name(&self, row: usize, name: &str) -> Result<i64, SearchError> {
        let column = self
            .column_index(name)
            .ok_or_else(|| SearchError::parse(format!("Missing column {}", name)))?;
        self.integer_at(row, column)
    }

    /// Map every row to a typed record, matching cells to fields by column name.
    pub fn into_objects<T: DeserializeOwned>(self) -> Result<Vec<T>, SearchError> {
        let names: Vec<String> = self.columns.into_iter().map(|c| c.name).collect();

        self.values
            .into_iter()
            .enumerate()
            .map(|(position, row)| {
                if row.len() != names.len() {
                    return Err(SearchError::parse(format!(
                        "Row {} has {} cells but there are {} columns",
                        position,
                        row.len(),
                        names.len()
                    )));
                }
                let object: Map<String, Value> = names.iter().cloned().zip(row).collect();
                serde_json::from_value(Value::Object(object)).map_err(|e| {
                    SearchError::parse(format!("Failed to map row {}: {}", position, e))
                })
            })
            .collect()
    }
}

/// A single failed item in a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    /// Zero-based position of the document in the payload.
    pub position: usize,
    pub reason: String,
}

/// Summary of a bulk indexing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkSummary {
    /// Build a summary from the `items` array of a bulk response.
    pub fn from_response(body: &Value) -> Self {
        let empty = Vec::new();
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .unwrap_or(&empty);

        let failures: Vec<BulkFailure> = items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                let error = item.get("index").and_then(|i| i.get("error"))?;
                let reason = error
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                Some(BulkFailure { position, reason })
            })
            .collect();

        Self {
            total: items.len(),
            succeeded: items.len() - failures.len(),
            failed: failures.len(),
            failures,
        }
    }
}
