//! Provided conversion stages and dead-letter output.

use std::fmt::Display;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::core::schema::{SchemaReference, TableSchema};
use crate::core::value::SqlValue;
use crate::dialect::{UnifiedType, UnifiedTypeMapper};
use crate::error::{Result, RowError};
use crate::source::SourceRow;

use super::failsafe::{ErrorDetail, FailsafeRecord};
use super::stage::ConversionStage;

/// Parses JSON document text into a [`SourceRow`].
///
/// The table name comes from `_metadata_table` when the document carries it.
#[derive(Debug, Clone)]
pub struct JsonToRow {
    schema_ref: SchemaReference,
    default_table: String,
}

impl JsonToRow {
    pub fn new(schema_ref: SchemaReference, default_table: impl Into<String>) -> Self {
        Self {
            schema_ref,
            default_table: default_table.into(),
        }
    }
}

impl ConversionStage for JsonToRow {
    type Input = String;
    type Output = SourceRow;
    type Error = RowError;

    fn name(&self) -> &str {
        "json_to_row"
    }

    fn convert(&self, input: &String) -> std::result::Result<SourceRow, RowError> {
        let row = SourceRow::from_json_str(&self.default_table, self.schema_ref.clone(), input)?;
        match row.source_table_name().map(str::to_string) {
            Some(table) => Ok(row.with_table_name(table)),
            None => Ok(row),
        }
    }
}

/// Renders a [`SourceRow`] as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowToJson;

impl ConversionStage for RowToJson {
    type Input = SourceRow;
    type Output = String;
    type Error = RowError;

    fn name(&self) -> &str {
        "row_to_json"
    }

    fn convert(&self, input: &SourceRow) -> std::result::Result<String, RowError> {
        Ok(serde_json::to_string(&input.to_json())?)
    }
}

/// Coerces a row to the unified types of a target table.
///
/// The output holds the table's sourced columns in declaration order. Fields
/// the row does not carry become NULL; a value that cannot be coerced fails
/// the record.
#[derive(Debug, Clone)]
pub struct RowToTargetRow {
    table: TableSchema,
    types: Vec<UnifiedType>,
}

impl RowToTargetRow {
    pub fn new(table: TableSchema, mapper: &UnifiedTypeMapper) -> Self {
        let types = table.sourced_columns().map(|c| mapper.map_column(c)).collect();
        Self { table, types }
    }
}

impl ConversionStage for RowToTargetRow {
    type Input = SourceRow;
    type Output = SourceRow;
    type Error = RowError;

    fn name(&self) -> &str {
        "row_to_target_row"
    }

    fn convert(&self, input: &SourceRow) -> std::result::Result<SourceRow, RowError> {
        let mut values = Vec::with_capacity(self.types.len());
        for (col, ty) in self.table.sourced_columns().zip(&self.types) {
            let value = match input.get(&col.name) {
                Some(v) => coerce(&col.name, v, ty)?,
                None => SqlValue::Null,
            };
            values.push((col.name.clone(), value));
        }

        let mut row = SourceRow::structured(self.table.name(), input.schema_ref().clone(), values);
        if let Some(stream) = input.stream_metadata() {
            row = row.with_stream_metadata(stream.clone());
        }
        Ok(row.with_diagnostics(input.diagnostics().to_vec()))
    }
}

fn mismatch(field: &str, ty: &UnifiedType, value: &SqlValue<'_>) -> RowError {
    RowError::field(field, ty.to_string(), format!("unexpected value {}", value))
}

fn coerce(
    field: &str,
    value: SqlValue<'_>,
    ty: &UnifiedType,
) -> std::result::Result<SqlValue<'static>, RowError> {
    let reject = |v: &SqlValue<'_>| mismatch(field, ty, v);

    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    let out = match ty {
        UnifiedType::Unsupported => SqlValue::Null,
        UnifiedType::Bool => match value {
            SqlValue::Bool(b) => SqlValue::Bool(b),
            // MySQL `tinyint(1)` arrives as 0/1.
            SqlValue::I64(0) => SqlValue::Bool(false),
            SqlValue::I64(1) => SqlValue::Bool(true),
            SqlValue::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => SqlValue::Bool(true),
                "false" | "0" => SqlValue::Bool(false),
                _ => return Err(reject(&value)),
            },
            other => return Err(reject(&other)),
        },
        UnifiedType::Int => match value {
            SqlValue::I64(i) => SqlValue::I64(i),
            SqlValue::Text(ref s) | SqlValue::Number(ref s) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::I64)
                .map_err(|e| RowError::field(field, ty.to_string(), e.to_string()))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::Float => match value {
            SqlValue::F64(f) => SqlValue::F64(f),
            SqlValue::I64(i) => SqlValue::F64(i as f64),
            SqlValue::Text(ref s) | SqlValue::Number(ref s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::F64)
                .map_err(|e| RowError::field(field, ty.to_string(), e.to_string()))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::NumericString => match value {
            SqlValue::Decimal(d) => SqlValue::text_owned(d.to_string()),
            SqlValue::I64(i) => SqlValue::text_owned(i.to_string()),
            SqlValue::F64(f) if f.is_finite() => SqlValue::text_owned(f.to_string()),
            SqlValue::Text(ref s) | SqlValue::Number(ref s) if is_numeric_literal(s.trim()) => {
                SqlValue::text_owned(s.trim().to_string())
            }
            other => return Err(reject(&other)),
        },
        UnifiedType::String => match value {
            SqlValue::Text(s) => SqlValue::text_owned(s.into_owned()),
            SqlValue::Json(v) => SqlValue::text_owned(v.to_string()),
            other => match other.to_json() {
                JsonValue::String(s) => SqlValue::text_owned(s),
                json => SqlValue::text_owned(json.to_string()),
            },
        },
        UnifiedType::Bytes => match value {
            SqlValue::Bytes(b) => SqlValue::bytes_owned(b.into_owned()),
            SqlValue::Text(ref s) => match decode_bytes(s.trim()) {
                Some(bytes) => SqlValue::bytes_owned(bytes),
                None => {
                    return Err(RowError::field(
                        field,
                        ty.to_string(),
                        "expected base64 or \\x-prefixed hex bytes",
                    ))
                }
            },
            other => return Err(reject(&other)),
        },
        UnifiedType::Date => match value {
            SqlValue::Date(d) => SqlValue::Date(d),
            SqlValue::Text(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(SqlValue::Date)
                .map_err(|e| RowError::field(field, ty.to_string(), e.to_string()))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::DateTime => match value {
            SqlValue::DateTime(dt) => SqlValue::DateTime(dt),
            SqlValue::Timestamp(ts) => SqlValue::DateTime(ts.naive_utc()),
            SqlValue::Text(ref s) => parse_naive_datetime(s.trim())
                .map(SqlValue::DateTime)
                .ok_or_else(|| reject(&value))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::Timestamp => match value {
            SqlValue::Timestamp(ts) => SqlValue::Timestamp(ts),
            SqlValue::DateTime(dt) => SqlValue::Timestamp(Utc.from_utc_datetime(&dt)),
            SqlValue::Text(ref s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|ts| SqlValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| RowError::field(field, ty.to_string(), e.to_string()))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::Json => match value {
            SqlValue::Json(v) => SqlValue::json_owned(v.into_owned()),
            SqlValue::Text(ref s) => SqlValue::json_owned(serde_json::from_str(s)?),
            other => SqlValue::json_owned(other.to_json()),
        },
        UnifiedType::Uuid => match value {
            SqlValue::Uuid(u) => SqlValue::Uuid(u),
            SqlValue::Text(ref s) => Uuid::from_str(s.trim())
                .map(SqlValue::Uuid)
                .map_err(|e| RowError::field(field, ty.to_string(), e.to_string()))?,
            other => return Err(reject(&other)),
        },
        UnifiedType::Array(inner) => match value {
            SqlValue::Array(items) => SqlValue::Array(
                items
                    .into_iter()
                    .map(|item| coerce(field, item, inner))
                    .collect::<std::result::Result<_, _>>()?,
            ),
            other => return Err(reject(&other)),
        },
        UnifiedType::Map(key_ty, value_ty) => match value {
            SqlValue::Map(entries) => SqlValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| -> std::result::Result<_, RowError> {
                        Ok((coerce(field, k, key_ty)?, coerce(field, v, value_ty)?))
                    })
                    .collect::<std::result::Result<_, _>>()?,
            ),
            SqlValue::Json(doc) => match doc.as_ref() {
                JsonValue::Object(obj) => {
                    let mut entries = Vec::with_capacity(obj.len());
                    for (k, v) in obj {
                        entries.push((
                            coerce(field, SqlValue::text_borrowed(k), key_ty)?,
                            coerce(field, SqlValue::from_json(v), value_ty)?,
                        ));
                    }
                    SqlValue::Map(entries)
                }
                _ => return Err(reject(&SqlValue::Json(doc.clone()))),
            },
            other => return Err(reject(&other)),
        },
    };

    Ok(out)
}

/// `-12`, `3.50`, `1e-7`, `+.5`.
fn is_numeric_literal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !digits(int_part) || !digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
    }
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Base64 (BigQuery and change-stream JSON) or PostgreSQL `\x` hex text.
fn decode_bytes(s: &str) -> Option<Vec<u8>> {
    match s.strip_prefix("\\x") {
        Some(hex_text) => hex::decode(hex_text).ok(),
        None => BASE64.decode(s).ok(),
    }
}

/// A failed record as written to a dead-letter destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadLetterRecord {
    /// Payload the record entered the pipeline with.
    pub original: String,
    /// Payload at the stage that failed.
    pub payload: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    /// Stage that routed the record to the failure output.
    pub stage: String,
    pub timestamp: DateTime<Utc>,
}

impl DeadLetterRecord {
    /// Build from a failed record. Returns `None` for records without an error.
    pub fn from_failure<O, T>(
        record: &FailsafeRecord<O, T>,
        stage: &str,
        include_trace: bool,
    ) -> Option<Self>
    where
        O: Display,
        T: Display,
    {
        let error = record.error()?;
        Some(Self {
            original: record.original().to_string(),
            payload: record.payload().to_string(),
            error_message: error.message.clone(),
            stacktrace: (include_trace && !error.trace.is_empty()).then(|| error.trace.clone()),
            stage: stage.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// One JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Failed record for a row the target rejected on insert.
///
/// Both payloads are the row JSON; the error JSON becomes the message.
pub fn wrap_insert_error(row_json: &str, error_json: &str) -> FailsafeRecord<String, String> {
    let message = serde_json::from_str::<JsonValue>(error_json)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| error_json.to_string());
    FailsafeRecord::of(row_json.to_string()).with_error(ErrorDetail::new(message, String::new()))
}
