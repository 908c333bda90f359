//! Change-data-capture accessors on [`SourceRow`].
//!
//! CDC producers write their bookkeeping into `_metadata_*` fields next to the
//! row data. These accessors resolve the source kind, primary keys and the
//! ordering keys used to apply events in commit order.

use serde_json::Value as JsonValue;

use crate::core::schema::SourceKind;
use crate::error::RowError;

use super::row::SourceRow;

pub const STREAM_NAME: &str = "_metadata_stream";
pub const SOURCE_TYPE: &str = "_metadata_source_type";
pub const SCHEMA_NAME: &str = "_metadata_schema";
pub const TABLE_NAME: &str = "_metadata_table";
pub const PRIMARY_KEYS: &str = "_metadata_primary_keys";
pub const TIMESTAMP: &str = "_metadata_timestamp";
pub const LOG_FILE: &str = "_metadata_log_file";
pub const LOG_POSITION: &str = "_metadata_log_position";
pub const LSN: &str = "_metadata_lsn";
pub const SCN: &str = "_metadata_scn";
pub const RS_ID: &str = "_metadata_rs_id";
pub const SSN: &str = "_metadata_ssn";
pub const DELETED: &str = "_metadata_deleted";
pub const ROW_ID: &str = "_metadata_row_id";
pub const TX_ID: &str = "_metadata_tx_id";

const MYSQL_SORT_FIELDS: &[&str] = &[TIMESTAMP, LOG_FILE, LOG_POSITION];
const POSTGRES_SORT_FIELDS: &[&str] = &[TIMESTAMP, LSN];
const ORACLE_SORT_FIELDS: &[&str] = &[TIMESTAMP, SCN, RS_ID, SSN];

impl SourceRow {
    /// Source kind of a CDC row.
    ///
    /// Uses `_metadata_source_type` when it is exactly a canonical kind name
    /// (`mysql`, `postgresql`, `oracle`, ...), otherwise the kind of the row's
    /// schema reference. Aliases and other casings are not recognized here.
    pub fn source_kind(&self) -> SourceKind {
        self.get_string(SOURCE_TYPE)
            .and_then(|s| SourceKind::ALL.iter().copied().find(|k| k.as_str() == s))
            .unwrap_or_else(|| self.schema_ref().kind())
    }

    pub fn stream_name(&self) -> Option<&str> {
        self.get_string(STREAM_NAME)
    }

    pub fn source_schema_name(&self) -> Option<&str> {
        self.get_string(SCHEMA_NAME)
    }

    pub fn source_table_name(&self) -> Option<&str> {
        self.get_string(TABLE_NAME)
    }

    pub fn oracle_row_id(&self) -> Option<&str> {
        self.get_string(ROW_ID)
    }

    pub fn oracle_tx_id(&self) -> Option<&str> {
        self.get_string(TX_ID)
    }

    /// Primary key column names.
    ///
    /// Read from `_metadata_primary_keys`, either a JSON array or its string
    /// rendering (`[a, "b"]`). Oracle rows without keys fall back to the row
    /// id; other kinds yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RowError::Metadata` when the field holds any other type.
    pub fn primary_keys(&self) -> Result<Vec<String>, RowError> {
        let keys = match self.get_json(PRIMARY_KEYS) {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(JsonValue::String(s)) => parse_key_list(&s),
            Some(other) => {
                return Err(RowError::metadata(
                    PRIMARY_KEYS,
                    format!("expected an array of column names, found {}", other),
                ))
            }
        };

        if keys.is_empty() && self.source_kind() == SourceKind::Oracle {
            return Ok(vec![ROW_ID.to_string()]);
        }
        Ok(keys)
    }

    /// Ordering keys for applying events in commit order.
    pub fn sort_fields(&self) -> Vec<&'static str> {
        self.sort_fields_with_deleted(false)
    }

    /// Ordering keys, optionally followed by the delete marker.
    pub fn sort_fields_with_deleted(&self, include_deleted: bool) -> Vec<&'static str> {
        let base = match self.source_kind() {
            SourceKind::MySql => MYSQL_SORT_FIELDS,
            SourceKind::PostgreSql => POSTGRES_SORT_FIELDS,
            _ => ORACLE_SORT_FIELDS,
        };
        let mut fields = base.to_vec();
        if include_deleted {
            fields.push(DELETED);
        }
        fields
    }

    /// Substitute `{field}` placeholders with string-valued fields.
    ///
    /// Placeholders naming absent or non-string fields are left as written.
    pub fn format_template(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match self.get_string(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// [`format_template`](Self::format_template) with `$` and `.` replaced by `_`.
    pub fn format_template_for_bigquery(&self, template: &str) -> String {
        self.format_template(template).replace(['$', '.'], "_")
    }

    /// [`format_template`](Self::format_template) restricted to `[0-9A-Za-z_]`.
    pub fn format_template_for_bigquery_dataset(&self, template: &str) -> String {
        self.format_template(template)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

/// `[a, "b", c]` → `["a", "b", "c"]`.
fn parse_key_list(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::SchemaReference;
    use crate::core::value::SqlValue;
    use serde_json::json;

    fn doc(kind: SourceKind, value: JsonValue) -> SourceRow {
        let schema = SchemaReference::new("cdc", kind).unwrap();
        match value {
            JsonValue::Object(map) => SourceRow::document("events", schema, map),
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_mysql_sort_fields() {
        let row = doc(SourceKind::Oracle, json!({"_metadata_source_type": "mysql", "id": 1}));
        assert_eq!(row.source_kind(), SourceKind::MySql);
        assert_eq!(
            row.sort_fields(),
            vec!["_metadata_timestamp", "_metadata_log_file", "_metadata_log_position"]
        );
        assert_eq!(
            row.sort_fields_with_deleted(true),
            vec![
                "_metadata_timestamp",
                "_metadata_log_file",
                "_metadata_log_position",
                "_metadata_deleted"
            ]
        );
    }

    #[test]
    fn test_postgres_and_default_sort_fields() {
        let pg = doc(SourceKind::MySql, json!({"_metadata_source_type": "postgresql"}));
        assert_eq!(pg.sort_fields(), vec!["_metadata_timestamp", "_metadata_lsn"]);

        let unknown = doc(SourceKind::GoogleSql, json!({"_metadata_source_type": "db2"}));
        assert_eq!(unknown.source_kind(), SourceKind::GoogleSql);

        let cased = doc(SourceKind::PostgreSql, json!({"_metadata_source_type": "MySQL"}));
        assert_eq!(cased.source_kind(), SourceKind::PostgreSql);
        let alias = doc(SourceKind::MySql, json!({"_metadata_source_type": "postgres"}));
        assert_eq!(alias.source_kind(), SourceKind::MySql);
        assert_eq!(
            unknown.sort_fields(),
            vec!["_metadata_timestamp", "_metadata_scn", "_metadata_rs_id", "_metadata_ssn"]
        );
    }

    #[test]
    fn test_source_kind_falls_back_to_schema() {
        let row = doc(SourceKind::PostgreSql, json!({"id": 1}));
        assert_eq!(row.source_kind(), SourceKind::PostgreSql);
    }

    #[test]
    fn test_primary_keys_array_and_string_forms() {
        let row = doc(SourceKind::MySql, json!({"_metadata_primary_keys": ["id", "region"]}));
        assert_eq!(row.primary_keys().unwrap(), vec!["id", "region"]);

        let row = doc(SourceKind::MySql, json!({"_metadata_primary_keys": "[id, \"region\"]"}));
        assert_eq!(row.primary_keys().unwrap(), vec!["id", "region"]);
    }

    #[test]
    fn test_primary_keys_oracle_fallback() {
        let row = doc(SourceKind::Oracle, json!({"_metadata_row_id": "AAAR3sAAEAAAACXAAA"}));
        assert_eq!(row.primary_keys().unwrap(), vec!["_metadata_row_id"]);

        let row = doc(SourceKind::Oracle, json!({"_metadata_primary_keys": []}));
        assert_eq!(row.primary_keys().unwrap(), vec!["_metadata_row_id"]);

        let row = doc(SourceKind::MySql, json!({"id": 1}));
        assert!(row.primary_keys().unwrap().is_empty());
    }

    #[test]
    fn test_primary_keys_rejects_other_types() {
        let row = doc(SourceKind::MySql, json!({"_metadata_primary_keys": 5}));
        assert!(matches!(row.primary_keys(), Err(RowError::Metadata { .. })));
    }

    #[test]
    fn test_primary_keys_on_structured_rows() {
        let schema = SchemaReference::new("cdc", SourceKind::Oracle).unwrap();
        let row = SourceRow::structured(
            "events",
            schema,
            vec![(
                PRIMARY_KEYS.to_string(),
                SqlValue::Array(vec!["order_id".into()]),
            )],
        );
        assert_eq!(row.primary_keys().unwrap(), vec!["order_id"]);
    }

    #[test]
    fn test_cdc_name_accessors() {
        let row = doc(
            SourceKind::Oracle,
            json!({
                "_metadata_stream": "projects/p/streams/s",
                "_metadata_schema": "HR",
                "_metadata_table": "EMPLOYEES",
                "_metadata_row_id": "AAAR3s",
                "_metadata_tx_id": "7.12.991"
            }),
        );
        assert_eq!(row.stream_name(), Some("projects/p/streams/s"));
        assert_eq!(row.source_schema_name(), Some("HR"));
        assert_eq!(row.source_table_name(), Some("EMPLOYEES"));
        assert_eq!(row.oracle_row_id(), Some("AAAR3s"));
        assert_eq!(row.oracle_tx_id(), Some("7.12.991"));
    }

    #[test]
    fn test_format_template() {
        let row = doc(
            SourceKind::MySql,
            json!({"_metadata_schema": "shop.v1", "_metadata_table": "order$items", "n": 3}),
        );
        assert_eq!(
            row.format_template("{_metadata_schema}_{_metadata_table}"),
            "shop.v1_order$items"
        );
        assert_eq!(row.format_template("x_{n}_{missing}"), "x_{n}_{missing}");
        assert_eq!(
            row.format_template_for_bigquery("{_metadata_schema}_{_metadata_table}"),
            "shop_v1_order_items"
        );
        assert_eq!(
            row.format_template_for_bigquery_dataset("{_metadata_schema}-raw"),
            "shop_v1_raw"
        );
        assert_eq!(row.format_template("unclosed {brace"), "unclosed {brace");
    }
}
