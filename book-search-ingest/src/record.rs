//! Typed rows produced by the record reader.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::{Field, FieldType};

/// A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Convert raw column text to `field_type`.
    ///
    /// Numbers are trimmed before parsing; text is kept verbatim. Empty
    /// numbers and non-finite floats are rejected.
    pub fn parse(raw: &str, field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::Text => Some(Self::Text(raw.to_string())),
            FieldType::Integer => raw.trim().parse::<i64>().ok().map(Self::Integer),
            FieldType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Float),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

/// One parsed row, values in schema order.
///
/// Serializes as a JSON object whose keys follow the schema's declared
/// field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<[Field]>,
    values: Vec<FieldValue>,
}

impl Record {
    pub(crate) fn new(fields: Arc<[Field]>, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self { fields, values }
    }

    /// Value of the named field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .and_then(|i| self.values.get(i))
    }

    /// Values in schema order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
