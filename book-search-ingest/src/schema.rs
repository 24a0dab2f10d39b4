//! Column schema for delimited input.
//!
//! A [`Schema`] names each field, gives it a semantic type, and says which
//! source column it is read from. It also carries the dialect: delimiter,
//! whether there is a header row, and whether one extra leading data row is
//! discarded.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::errors::IngestError;

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Zero-based source column the value is read from.
    pub column: usize,
}

/// Immutable description of the rows in a delimited stream.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Arc<[Field]>,
    delimiter: u8,
    has_header: bool,
    skip_first_data_row: bool,
}

impl Schema {
    /// Start building a schema. Defaults: `,` delimiter, header row present,
    /// no extra data row skipped.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Schema of the published books dataset.
    ///
    /// The file is `;`-separated and repeats its header as the first data
    /// row, so that row is skipped as well.
    pub fn books() -> Self {
        Self {
            fields: Arc::from(vec![
                Field { name: "title".to_string(), field_type: FieldType::Text, column: 0 },
                Field { name: "description".to_string(), field_type: FieldType::Text, column: 1 },
                Field { name: "author".to_string(), field_type: FieldType::Text, column: 2 },
                Field { name: "year".to_string(), field_type: FieldType::Integer, column: 3 },
                Field { name: "publisher".to_string(), field_type: FieldType::Text, column: 4 },
                Field { name: "ratings".to_string(), field_type: FieldType::Float, column: 5 },
            ]),
            delimiter: b';',
            has_header: true,
            skip_first_data_row: true,
        }
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn shared_fields(&self) -> Arc<[Field]> {
        Arc::clone(&self.fields)
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn skip_first_data_row(&self) -> bool {
        self.skip_first_data_row
    }

    /// Copy of this schema with a different delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Copy of this schema with the header flag changed.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Copy of this schema with the skip-first-data-row flag changed.
    pub fn with_skip_first_data_row(mut self, skip: bool) -> Self {
        self.skip_first_data_row = skip;
        self
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    delimiter: u8,
    has_header: bool,
    skip_first_data_row: bool,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            delimiter: b',',
            has_header: true,
            skip_first_data_row: false,
        }
    }
}

impl SchemaBuilder {
    /// Add a field read from the next column in declaration order.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let column = self.fields.len();
        self.fields.push(Field {
            name: name.into(),
            field_type,
            column,
        });
        self
    }

    /// Add a field read from an explicit column.
    pub fn field_at(mut self, name: impl Into<String>, field_type: FieldType, column: usize) -> Self {
        self.fields.push(Field {
            name: name.into(),
            field_type,
            column,
        });
        self
    }

    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Text)
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Integer)
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.field(name, FieldType::Float)
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn skip_first_data_row(mut self, skip: bool) -> Self {
        self.skip_first_data_row = skip;
        self
    }

    /// Validate and build the schema.
    ///
    /// # Returns
    ///
    /// * `Err(IngestError::InvalidSchema)` - If there are no fields, a field
    ///   name is empty or repeated, or two fields read the same column
    pub fn build(self) -> Result<Schema, IngestError> {
        if self.fields.is_empty() {
            return Err(IngestError::invalid_schema("schema has no fields"));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(IngestError::invalid_schema("field name is empty"));
            }
            if !names.insert(field.name.as_str()) {
                return Err(IngestError::invalid_schema(format!(
                    "field {} is declared twice",
                    field.name
                )));
            }
            if !columns.insert(field.column) {
                return Err(IngestError::invalid_schema(format!(
                    "column {} is mapped by more than one field",
                    field.column
                )));
            }
        }

        Ok(Schema {
            fields: Arc::from(self.fields),
            delimiter: self.delimiter,
            has_header: self.has_header,
            skip_first_data_row: self.skip_first_data_row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_books_schema() {
        let schema = Schema::books();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["title", "description", "author", "year", "publisher", "ratings"]
        );
        assert_eq!(schema.delimiter(), b';');
        assert!(schema.has_header());
        assert!(schema.skip_first_data_row());
        assert_eq!(schema.fields()[3].field_type, FieldType::Integer);
        assert_eq!(schema.fields()[5].column, 5);
    }

    #[test]
    fn test_builder_assigns_columns_in_order() {
        let schema = Schema::builder()
            .text("name")
            .integer("age")
            .float("score")
            .delimiter(b'\t')
            .build()
            .unwrap();

        let columns: Vec<usize> = schema.fields().iter().map(|f| f.column).collect();
        assert_eq!(columns, vec![0, 1, 2]);
        assert_eq!(schema.delimiter(), b'\t');
        assert!(!schema.skip_first_data_row());
    }

    #[test]
    fn test_builder_rejects_empty_schema() {
        assert!(matches!(
            Schema::builder().build(),
            Err(IngestError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let duplicate_name = Schema::builder().text("a").text("a").build();
        assert!(matches!(duplicate_name, Err(IngestError::InvalidSchema(_))));

        let duplicate_column = Schema::builder()
            .field_at("a", FieldType::Text, 2)
            .field_at("b", FieldType::Text, 2)
            .build();
        assert!(matches!(duplicate_column, Err(IngestError::InvalidSchema(_))));
    }

    #[test]
    fn test_with_overrides() {
        let schema = Schema::books()
            .with_delimiter(b',')
            .with_header(false)
            .with_skip_first_data_row(false);

        assert_eq!(schema.delimiter(), b',');
        assert!(!schema.has_header());
        assert!(!schema.skip_first_data_row());
    }
}
