//! Read planning: schema + allow-list + dialect → one read per table.
//!
//! Planning is pure. It renders query text and never executes anything;
//! execution belongs to the external runner that consumes [`ReadSpec`]s.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::schema::{DatabaseSchema, TableSchema};
use crate::core::traits::Dialect;
use crate::dialect::UnifiedTypeMapper;
use crate::drivers::{self, SqlDialect};
use crate::error::{BridgeError, Result};

/// Upper bound on read partitions requested per table.
pub const MAX_PARTITIONS: usize = 1000;

/// Alias of the column carrying the source table name in every read.
pub const SOURCE_TABLE_COLUMN: &str = "_source_table";

/// A planned read of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadSpec {
    pub table_name: String,
    pub query: String,
    pub max_partitions: usize,
}

/// Split a comma-separated allow-list, trimming entries and dropping empty ones.
///
/// `"a, b,c"` → `["a", "b", "c"]`.
pub fn parse_table_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Plans reads for one dialect.
#[derive(Debug, Clone)]
pub struct ReadPlanner {
    dialect: SqlDialect,
    type_mapper: UnifiedTypeMapper,
}

impl ReadPlanner {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            type_mapper: UnifiedTypeMapper::with_builtins(),
        }
    }

    /// Use a mapper with custom type overrides.
    #[must_use]
    pub fn with_type_mapper(mut self, type_mapper: UnifiedTypeMapper) -> Self {
        self.type_mapper = type_mapper;
        self
    }

    pub fn dialect(&self) -> &SqlDialect {
        &self.dialect
    }

    /// Plan reads for the tables selected by `allow_list`.
    ///
    /// An empty allow-list selects every table. Selected tables pull in their
    /// interleaving ancestors and the tables their foreign keys reference.
    /// Output follows schema order.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Config` if the allow-list names a table the schema lacks
    /// - `BridgeError::Schema` if a parent or referenced table is missing
    /// - `BridgeError::InvalidIdentifier` for names that cannot be quoted
    pub fn plan(&self, schema: &DatabaseSchema, allow_list: &[String]) -> Result<Vec<ReadSpec>> {
        let selected = select_tables(schema, allow_list)?;

        let mut reads =
            Vec::with_capacity(selected.as_ref().map_or(schema.tables().len(), HashSet::len));
        for table in schema.tables() {
            if let Some(selected) = &selected {
                if !selected.contains(table.name()) {
                    continue;
                }
            }
            let read = self.plan_table(table)?;
            info!(
                "Planned read for table {} ({} columns)",
                table.name(),
                table.sourced_columns().count()
            );
            debug!("{}", read.query);
            reads.push(read);
        }

        Ok(reads)
    }

    /// Plan the read of a single table.
    pub fn plan_table(&self, table: &TableSchema) -> Result<ReadSpec> {
        let mut select = format!(
            "SELECT {} AS {}",
            self.dialect.string_literal(table.name()),
            SOURCE_TABLE_COLUMN
        );

        let exprs = table
            .sourced_columns()
            .map(|col| drivers::column_expression(col, &self.dialect, &self.type_mapper))
            .collect::<Result<Vec<_>>>()?;
        if !exprs.is_empty() {
            select.push_str(", ");
            select.push_str(&exprs.join(","));
        }

        let query = format!(
            "{} FROM {} AS t",
            select,
            self.dialect.quote_ident(table.name())?
        );

        Ok(ReadSpec {
            table_name: table.name().to_string(),
            query,
            max_partitions: MAX_PARTITIONS,
        })
    }
}

/// Plan reads from a comma-separated allow-list.
pub fn build_reads(
    schema: &DatabaseSchema,
    allow_list: Option<&str>,
    dialect: SqlDialect,
) -> Result<Vec<ReadSpec>> {
    let tables = allow_list.map(parse_table_list).unwrap_or_default();
    ReadPlanner::new(dialect).plan(schema, &tables)
}

/// Table names selected by the allow-list plus every table they depend on:
/// interleaving ancestors and foreign-key targets, followed transitively.
/// `None` selects everything.
fn select_tables(
    schema: &DatabaseSchema,
    allow_list: &[String],
) -> Result<Option<HashSet<String>>> {
    if allow_list.is_empty() {
        return Ok(None);
    }

    let missing: Vec<&str> = allow_list
        .iter()
        .map(String::as_str)
        .filter(|name| schema.table(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(BridgeError::Config(format!(
            "tables not found in schema {}: {}",
            schema.reference(),
            missing.join(", ")
        )));
    }

    let mut selected = HashSet::new();
    let mut pending: Vec<(&str, Option<&str>)> =
        allow_list.iter().map(|name| (name.as_str(), None)).collect();

    while let Some((table_name, required_by)) = pending.pop() {
        if !selected.insert(table_name.to_string()) {
            continue;
        }
        let table = schema.table(table_name).ok_or_else(|| {
            BridgeError::schema(format!(
                "table '{}' required by '{}' is not part of schema {}",
                table_name,
                required_by.unwrap_or(table_name),
                schema.reference()
            ))
        })?;

        if let Some(parent) = table.parent_table() {
            pending.push((parent, Some(table.name())));
        }
        for referenced in table.foreign_key_tables() {
            pending.push((referenced.as_str(), Some(table.name())));
        }
    }

    Ok(Some(selected))
}
