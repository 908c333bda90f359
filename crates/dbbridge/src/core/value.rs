//! SQL value types carried by source rows.
//!
//! Values borrow from their source buffer where possible (`Cow`), so reading a
//! field out of a row does not copy text or bytes unless the caller asks for an
//! owned value.

use std::borrow::Cow;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use uuid::Uuid;

/// A single field value in a source row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Any integer width, widened to 64 bits.
    I64(i64),

    /// Any floating point width, widened to 64 bits.
    F64(f64),

    /// Exact decimal.
    Decimal(Decimal),

    /// JSON number literal outside the `i64` range, kept verbatim.
    Number(Cow<'a, str>),

    /// Text data with zero-copy support.
    Text(Cow<'a, str>),

    /// Binary data with zero-copy support.
    Bytes(Cow<'a, [u8]>),

    /// UUID value.
    Uuid(Uuid),

    /// Date without time component.
    Date(NaiveDate),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Instant in UTC.
    Timestamp(DateTime<Utc>),

    /// Structured JSON document.
    Json(Cow<'a, JsonValue>),

    /// Ordered collection (list or set).
    Array(Vec<SqlValue<'a>>),

    /// Key/value collection in source order.
    Map(Vec<(SqlValue<'a>, SqlValue<'a>)>),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(v) => SqlValue::Bool(v),
            SqlValue::I64(v) => SqlValue::I64(v),
            SqlValue::F64(v) => SqlValue::F64(v),
            SqlValue::Decimal(v) => SqlValue::Decimal(v),
            SqlValue::Number(v) => SqlValue::Number(Cow::Owned(v.into_owned())),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
            SqlValue::Uuid(v) => SqlValue::Uuid(v),
            SqlValue::Date(v) => SqlValue::Date(v),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
            SqlValue::Timestamp(v) => SqlValue::Timestamp(v),
            SqlValue::Json(v) => SqlValue::Json(Cow::Owned(v.into_owned())),
            SqlValue::Array(items) => {
                SqlValue::Array(items.into_iter().map(SqlValue::into_owned).collect())
            }
            SqlValue::Map(entries) => SqlValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            ),
        }
    }

    /// Borrow this value without copying text, bytes or documents.
    #[must_use]
    pub fn as_borrowed(&self) -> SqlValue<'_> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(v) => SqlValue::Bool(*v),
            SqlValue::I64(v) => SqlValue::I64(*v),
            SqlValue::F64(v) => SqlValue::F64(*v),
            SqlValue::Decimal(v) => SqlValue::Decimal(*v),
            SqlValue::Number(v) => SqlValue::Number(Cow::Borrowed(v.as_ref())),
            SqlValue::Text(v) => SqlValue::Text(Cow::Borrowed(v.as_ref())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Borrowed(v.as_ref())),
            SqlValue::Uuid(v) => SqlValue::Uuid(*v),
            SqlValue::Date(v) => SqlValue::Date(*v),
            SqlValue::DateTime(v) => SqlValue::DateTime(*v),
            SqlValue::Timestamp(v) => SqlValue::Timestamp(*v),
            SqlValue::Json(v) => SqlValue::Json(Cow::Borrowed(v.as_ref())),
            SqlValue::Array(items) => SqlValue::Array(items.iter().map(|v| v.as_borrowed()).collect()),
            SqlValue::Map(entries) => SqlValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_borrowed(), v.as_borrowed()))
                    .collect(),
            ),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Literal text of a wide JSON number.
    #[must_use]
    pub fn as_number(&self) -> Option<&str> {
        match self {
            SqlValue::Number(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    ///
    /// Bytes are base64 encoded, decimals keep their exact text form, and
    /// non-finite floats become the strings `NaN`, `Infinity` and `-Infinity`.
    /// Maps with non-text keys use the key's JSON text as the object key.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(v) => JsonValue::Bool(*v),
            SqlValue::I64(v) => JsonValue::Number((*v).into()),
            SqlValue::F64(v) => match Number::from_f64(*v) {
                Some(n) => JsonValue::Number(n),
                None => JsonValue::String(non_finite_name(*v).to_string()),
            },
            SqlValue::Decimal(v) => JsonValue::String(v.to_string()),
            SqlValue::Number(v) => serde_json::from_str::<Number>(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|_| JsonValue::String(v.to_string())),
            SqlValue::Text(v) => JsonValue::String(v.to_string()),
            SqlValue::Bytes(v) => JsonValue::String(BASE64.encode(v)),
            SqlValue::Uuid(v) => JsonValue::String(v.to_string()),
            SqlValue::Date(v) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
            SqlValue::DateTime(v) => {
                JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            SqlValue::Timestamp(v) => JsonValue::String(v.to_rfc3339()),
            SqlValue::Json(v) => v.as_ref().clone(),
            SqlValue::Array(items) => JsonValue::Array(items.iter().map(SqlValue::to_json).collect()),
            SqlValue::Map(entries) => {
                let mut obj = JsonMap::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match k {
                        SqlValue::Text(s) => s.to_string(),
                        other => other.to_json().to_string(),
                    };
                    obj.insert(key, v.to_json());
                }
                JsonValue::Object(obj)
            }
        }
    }

    /// Convert a borrowed JSON value into the closest SQL value.
    ///
    /// Objects stay documents; arrays become arrays of converted elements.
    /// Numbers outside the `i64` range keep their literal text.
    #[must_use]
    pub fn from_json(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(v) => SqlValue::Bool(*v),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::I64(i),
                None => SqlValue::Number(Cow::Owned(n.to_string())),
            },
            JsonValue::String(s) => SqlValue::Text(Cow::Borrowed(s.as_str())),
            JsonValue::Array(items) => SqlValue::Array(items.iter().map(SqlValue::from_json).collect()),
            JsonValue::Object(_) => SqlValue::Json(Cow::Borrowed(value)),
        }
    }
}

fn non_finite_name(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_negative() {
        "-Infinity"
    } else {
        "Infinity"
    }
}

impl fmt::Display for SqlValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// Convenience constructors for common cases
impl<'a> SqlValue<'a> {
    /// Create a text value from a borrowed string slice.
    #[must_use]
    pub fn text_borrowed(s: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(s))
    }

    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> SqlValue<'static> {
        SqlValue::Text(Cow::Owned(s))
    }

    /// Create a bytes value from an owned Vec<u8>.
    #[must_use]
    pub fn bytes_owned(b: Vec<u8>) -> SqlValue<'static> {
        SqlValue::Bytes(Cow::Owned(b))
    }

    /// Create a JSON document value from an owned JSON value.
    #[must_use]
    pub fn json_owned(v: JsonValue) -> SqlValue<'static> {
        SqlValue::Json(Cow::Owned(v))
    }
}

impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::I64(v as i64)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Uuid> for SqlValue<'static> {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDate> for SqlValue<'static> {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<DateTime<Utc>> for SqlValue<'static> {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<'a, T> From<Option<T>> for SqlValue<'a>
where
    T: Into<SqlValue<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}
