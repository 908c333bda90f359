//! Normalized source row.
//!
//! A [`SourceRow`] carries the table it came from, the schema it belongs to,
//! and an ordered payload. The payload is either a structured row (column name
//! to [`SqlValue`]) or a JSON document, as produced by CDC streams. Accessors
//! behave the same for both representations; the branching stays in this
//! module.

use std::fmt;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::core::schema::SchemaReference;
use crate::core::value::SqlValue;
use crate::error::RowError;

/// Ordered field payload of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowPayload {
    /// Column values in declaration order.
    Structured(Vec<(String, SqlValue<'static>)>),
    /// JSON object in document order.
    Document(JsonMap<String, JsonValue>),
}

/// Read metadata attached by change streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    /// Partition or shard the record was read from.
    pub shard_id: Option<String>,
    /// Read time in microseconds since the epoch.
    pub read_time_micros: Option<i64>,
}

/// A field that was degraded to NULL while mapping a driver row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiagnostic {
    pub field: String,
    pub reason: String,
}

impl FieldDiagnostic {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A record read from a source, normalized across row formats.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    table_name: String,
    schema_ref: SchemaReference,
    payload: RowPayload,
    stream: Option<StreamMetadata>,
    diagnostics: Vec<FieldDiagnostic>,
}

impl SourceRow {
    /// Row backed by structured column values.
    pub fn structured(
        table_name: impl Into<String>,
        schema_ref: SchemaReference,
        values: Vec<(String, SqlValue<'static>)>,
    ) -> Self {
        Self::with_payload(table_name, schema_ref, RowPayload::Structured(values))
    }

    /// Row backed by a JSON document.
    pub fn document(
        table_name: impl Into<String>,
        schema_ref: SchemaReference,
        doc: JsonMap<String, JsonValue>,
    ) -> Self {
        Self::with_payload(table_name, schema_ref, RowPayload::Document(doc))
    }

    /// Parse a JSON object into a document row.
    ///
    /// # Errors
    ///
    /// Returns `RowError::Json` for invalid JSON and
    /// `RowError::MalformedPayload` when the top-level value is not an object.
    pub fn from_json_str(
        table_name: impl Into<String>,
        schema_ref: SchemaReference,
        text: &str,
    ) -> Result<Self, RowError> {
        match serde_json::from_str::<JsonValue>(text)? {
            JsonValue::Object(doc) => Ok(Self::document(table_name, schema_ref, doc)),
            other => Err(RowError::MalformedPayload(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn with_payload(
        table_name: impl Into<String>,
        schema_ref: SchemaReference,
        payload: RowPayload,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            schema_ref,
            payload,
            stream: None,
            diagnostics: Vec::new(),
        }
    }

    /// Replace the table name.
    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Attach change-stream read metadata.
    #[must_use]
    pub fn with_stream_metadata(mut self, stream: StreamMetadata) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Attach field diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<FieldDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema_ref(&self) -> &SchemaReference {
        &self.schema_ref
    }

    pub fn payload(&self) -> &RowPayload {
        &self.payload
    }

    pub fn stream_metadata(&self) -> Option<&StreamMetadata> {
        self.stream.as_ref()
    }

    /// Fields degraded to NULL during mapping.
    pub fn diagnostics(&self) -> &[FieldDiagnostic] {
        &self.diagnostics
    }

    /// Field names in payload order.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.payload {
            RowPayload::Structured(values) => values.iter().map(|(k, _)| k.as_str()).collect(),
            RowPayload::Document(doc) => doc.keys().map(String::as_str).collect(),
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        match &self.payload {
            RowPayload::Structured(values) => values.len(),
            RowPayload::Document(doc) => doc.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a field is present (it may still be NULL).
    pub fn contains(&self, field: &str) -> bool {
        match &self.payload {
            RowPayload::Structured(values) => values.iter().any(|(k, _)| k == field),
            RowPayload::Document(doc) => doc.contains_key(field),
        }
    }

    /// Borrow a field value. `None` when the field is absent.
    pub fn get(&self, field: &str) -> Option<SqlValue<'_>> {
        match &self.payload {
            RowPayload::Structured(values) => values
                .iter()
                .find(|(k, _)| k == field)
                .map(|(_, v)| v.as_borrowed()),
            RowPayload::Document(doc) => doc.get(field).map(SqlValue::from_json),
        }
    }

    /// Borrow a field as text. `None` when absent or not a string.
    pub fn get_string(&self, field: &str) -> Option<&str> {
        match &self.payload {
            RowPayload::Structured(values) => values
                .iter()
                .find(|(k, _)| k == field)
                .and_then(|(_, v)| v.as_str()),
            RowPayload::Document(doc) => doc.get(field).and_then(JsonValue::as_str),
        }
    }

    /// Raw JSON value of a field, converting structured values on demand.
    pub(crate) fn get_json(&self, field: &str) -> Option<JsonValue> {
        match &self.payload {
            RowPayload::Structured(values) => values
                .iter()
                .find(|(k, _)| k == field)
                .map(|(_, v)| v.to_json()),
            RowPayload::Document(doc) => doc.get(field).cloned(),
        }
    }

    /// Render the row as a JSON object in payload order.
    pub fn to_json(&self) -> JsonValue {
        match &self.payload {
            RowPayload::Structured(values) => {
                let mut obj = JsonMap::with_capacity(values.len());
                for (k, v) in values {
                    obj.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(obj)
            }
            RowPayload::Document(doc) => JsonValue::Object(doc.clone()),
        }
    }
}

impl fmt::Display for SourceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
