//! Driver row → [`SourceRow`] mapping.
//!
//! The mapper walks the declared columns of one table. A column whose type is
//! unsupported, absent from the driver row, or unreadable becomes NULL with a
//! [`FieldDiagnostic`]; mapping itself never fails.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::schema::{SchemaReference, TableSchema};
use crate::core::traits::DriverRow;
use crate::core::value::SqlValue;
use crate::dialect::UnifiedTypeMapper;
use crate::error::RowError;

use super::row::{FieldDiagnostic, SourceRow};

/// Maps driver rows of one table into [`SourceRow`]s.
#[derive(Debug)]
pub struct SourceRowMapper {
    schema_ref: SchemaReference,
    table: TableSchema,
    type_mapper: UnifiedTypeMapper,
    rows_mapped: AtomicU64,
    degraded_fields: AtomicU64,
}

impl SourceRowMapper {
    pub fn new(schema_ref: SchemaReference, table: TableSchema) -> Self {
        Self::with_type_mapper(schema_ref, table, UnifiedTypeMapper::with_builtins())
    }

    pub fn with_type_mapper(
        schema_ref: SchemaReference,
        table: TableSchema,
        type_mapper: UnifiedTypeMapper,
    ) -> Self {
        Self {
            schema_ref,
            table,
            type_mapper,
            rows_mapped: AtomicU64::new(0),
            degraded_fields: AtomicU64::new(0),
        }
    }

    pub fn table(&self) -> &TableSchema {
        &self.table
    }

    /// Rows mapped so far.
    pub fn rows_mapped(&self) -> u64 {
        self.rows_mapped.load(Ordering::Relaxed)
    }

    /// Fields degraded to NULL so far.
    pub fn degraded_fields(&self) -> u64 {
        self.degraded_fields.load(Ordering::Relaxed)
    }

    /// Map one driver row.
    pub fn map_row<R: DriverRow + ?Sized>(&self, row: &R) -> SourceRow {
        let mut values = Vec::with_capacity(self.table.columns().len());
        let mut diagnostics = Vec::new();

        for col in self.table.sourced_columns() {
            let ty = self.type_mapper.map_column(col);

            let value = if ty.is_unsupported() {
                debug!(
                    "{}.{}: unsupported type {}, reading as NULL",
                    self.table.name(),
                    col.name,
                    col.raw_type
                );
                diagnostics.push(FieldDiagnostic::new(
                    &col.name,
                    format!("unsupported source type {}", col.raw_type),
                ));
                SqlValue::Null
            } else {
                match row.column_value(&col.name) {
                    Ok(Some(v)) => v.into_owned(),
                    Ok(None) => {
                        debug!("{}.{}: column absent from row", self.table.name(), col.name);
                        diagnostics.push(FieldDiagnostic::new(&col.name, "column absent from row"));
                        SqlValue::Null
                    }
                    Err(e) => {
                        warn!("{}.{}: unreadable value: {}", self.table.name(), col.name, e);
                        diagnostics.push(FieldDiagnostic::new(&col.name, e.to_string()));
                        SqlValue::Null
                    }
                }
            };

            values.push((col.name.clone(), value));
        }

        self.rows_mapped.fetch_add(1, Ordering::Relaxed);
        if !diagnostics.is_empty() {
            self.degraded_fields
                .fetch_add(diagnostics.len() as u64, Ordering::Relaxed);
        }

        SourceRow::structured(self.table.name(), self.schema_ref.clone(), values)
            .with_diagnostics(diagnostics)
    }

    /// Lazily map a cursor of driver rows.
    pub fn map_rows<I>(&self, cursor: I) -> MappedRows<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: DriverRow,
    {
        MappedRows {
            mapper: self,
            cursor: cursor.into_iter(),
        }
    }
}

/// Single-pass iterator of mapped rows. Dropping it drops the cursor.
pub struct MappedRows<'a, I> {
    mapper: &'a SourceRowMapper,
    cursor: I,
}

impl<I> Iterator for MappedRows<'_, I>
where
    I: Iterator,
    I::Item: DriverRow,
{
    type Item = SourceRow;

    fn next(&mut self) -> Option<SourceRow> {
        self.cursor.next().map(|row| self.mapper.map_row(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}

/// A driver cell: a decoded value or a decoding failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCell {
    Value(SqlValue<'static>),
    Unreadable(String),
}

impl DriverCell {
    fn read(&self, column: &str) -> Result<Option<SqlValue<'_>>, RowError> {
        match self {
            DriverCell::Value(v) => Ok(Some(v.as_borrowed())),
            DriverCell::Unreadable(msg) => Err(RowError::field(column, "driver value", msg.clone())),
        }
    }
}

impl From<SqlValue<'static>> for DriverCell {
    fn from(v: SqlValue<'static>) -> Self {
        DriverCell::Value(v)
    }
}

/// Name-addressed row, as returned by structured driver APIs.
#[derive(Debug, Clone, Default)]
pub struct NamedRow {
    cells: Vec<(String, DriverCell)>,
}

impl NamedRow {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue<'static>>) -> Self {
        self.cells
            .push((name.into(), DriverCell::Value(value.into())));
        self
    }

    #[must_use]
    pub fn with_unreadable(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.cells
            .push((name.into(), DriverCell::Unreadable(message.into())));
        self
    }
}

impl DriverRow for NamedRow {
    fn column_value(&self, name: &str) -> Result<Option<SqlValue<'_>>, RowError> {
        match self.cells.iter().find(|(n, _)| n == name) {
            Some((_, cell)) => cell.read(name),
            None => Ok(None),
        }
    }
}

/// Column definitions plus positional values, as returned by newer driver APIs.
///
/// Definitions are shared between all rows of one result set.
#[derive(Debug, Clone)]
pub struct PositionalRow {
    columns: Arc<[String]>,
    cells: Vec<DriverCell>,
}

impl PositionalRow {
    pub fn new(columns: Arc<[String]>, cells: Vec<DriverCell>) -> Self {
        Self { columns, cells }
    }
}

impl DriverRow for PositionalRow {
    fn column_value(&self, name: &str) -> Result<Option<SqlValue<'_>>, RowError> {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return Ok(None);
        };
        match self.cells.get(idx) {
            Some(cell) => cell.read(name),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnType, SourceKind};

    fn mapper() -> SourceRowMapper {
        let table = TableSchema::new(
            "players",
            vec![
                ColumnType::new("id", "uuid", SourceKind::Cassandra),
                ColumnType::new("name", "text", SourceKind::Cassandra),
                ColumnType::new("scores", "list<int>", SourceKind::Cassandra),
                ColumnType::new("location", "tuple<double,double>", SourceKind::Cassandra),
            ],
        )
        .unwrap();
        let schema = SchemaReference::new("league", SourceKind::Cassandra).unwrap();
        SourceRowMapper::new(schema, table)
    }

    fn named() -> NamedRow {
        NamedRow::new()
            .with("id", uuid::Uuid::nil())
            .with("name", "ada")
            .with("scores", SqlValue::Array(vec![1.into(), 2.into()]))
            .with("location", "(1.0, 2.0)")
    }

    #[test]
    fn test_unsupported_column_reads_as_null() {
        let m = mapper();
        let row = m.map_row(&named());
        assert_eq!(row.get("location"), Some(SqlValue::Null));
        assert_eq!(row.get_string("name"), Some("ada"));
        assert_eq!(row.diagnostics().len(), 1);
        assert_eq!(row.diagnostics()[0].field, "location");
        assert_eq!(m.degraded_fields(), 1);
        assert_eq!(m.rows_mapped(), 1);
    }

    #[test]
    fn test_absent_and_unreadable_columns_degrade() {
        let m = mapper();
        let row = m.map_row(&NamedRow::new().with("id", uuid::Uuid::nil()).with_unreadable(
            "name",
            "invalid utf-8",
        ));
        assert_eq!(row.get("name"), Some(SqlValue::Null));
        assert_eq!(row.get("scores"), Some(SqlValue::Null));
        let fields: Vec<_> = row.diagnostics().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "scores", "location"]);
        assert!(row.diagnostics()[0].reason.contains("invalid utf-8"));
    }

    #[test]
    fn test_row_variants_map_identically() {
        let m = mapper();
        let columns: Arc<[String]> = vec![
            "location".to_string(),
            "scores".to_string(),
            "name".to_string(),
            "id".to_string(),
        ]
        .into();
        let positional = PositionalRow::new(
            columns,
            vec![
                DriverCell::Value("(1.0, 2.0)".into()),
                DriverCell::Value(SqlValue::Array(vec![1.into(), 2.into()])),
                DriverCell::Value("ada".into()),
                DriverCell::Value(uuid::Uuid::nil().into()),
            ],
        );

        assert_eq!(m.map_row(&named()), m.map_row(&positional));
    }

    #[test]
    fn test_map_rows_is_lazy() {
        let m = mapper();
        let mut rows = m.map_rows(vec![named(), named(), named()]);
        assert_eq!(m.rows_mapped(), 0);
        let first = rows.next().unwrap();
        assert_eq!(first.field_names(), vec!["id", "name", "scores", "location"]);
        assert_eq!(m.rows_mapped(), 1);
        drop(rows);
        assert_eq!(m.rows_mapped(), 1);
    }

    #[test]
    fn test_generated_columns_are_not_mapped() {
        let table = TableSchema::new(
            "orders",
            vec![
                ColumnType::new("id", "INT64", SourceKind::GoogleSql),
                ColumnType::new("total", "NUMERIC", SourceKind::GoogleSql).generated(),
            ],
        )
        .unwrap();
        let schema = SchemaReference::new("shop", SourceKind::GoogleSql).unwrap();
        let m = SourceRowMapper::new(schema, table);
        let row = m.map_row(&NamedRow::new().with("id", 1i64));
        assert_eq!(row.field_names(), vec!["id"]);
        assert!(row.diagnostics().is_empty());
    }
}
