//! Schema introspection module.
//!
//! Builds the [`SchemaGraph`] of the currently selected database: every base
//! table of the default schema, its columns in declaration order, and its
//! foreign keys.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Database-specific implementations live in the `postgres` and
//! `mysql` submodules, each returning the same raw shapes.

use crate::db::pool::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ColumnDescriptor, ForeignKeyDescriptor, SchemaGraph, TableDescriptor};
use tracing::{debug, info, warn};

/// One column of a foreign key constraint as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ForeignKeyColumnRow {
    constraint_name: String,
    referenced_table: String,
    column: String,
    referenced_column: String,
}

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Introspect the whole database behind `pool`.
    ///
    /// Any catalog error aborts the scan; a partial graph is never returned.
    pub async fn inspect(pool: &DbPool, database: &str) -> AppResult<SchemaGraph> {
        let result = match pool {
            DbPool::Postgres(p) => postgres::inspect(p).await,
            DbPool::MySql(p) => mysql::inspect(p).await,
        };
        let tables = result.map_err(|e| AppError::introspection(database, e.to_string()))?;

        let graph = SchemaGraph::new(database, tables);
        for dangling in graph.dangling_references() {
            warn!(
                database = %database,
                table = %dangling.from_table,
                referenced_table = %dangling.referenced_table,
                "Foreign key references a table outside the introspected schema"
            );
        }
        info!(
            database = %database,
            tables = graph.tables.len(),
            foreign_keys = graph.edge_count(),
            "Introspected schema"
        );
        Ok(graph)
    }
}

/// Fold per-column catalog rows into one descriptor per constraint.
///
/// Rows must arrive grouped by constraint with columns in key order.
/// Composite keys list their columns comma-separated.
fn group_foreign_keys(rows: Vec<ForeignKeyColumnRow>) -> Vec<ForeignKeyDescriptor> {
    let mut grouped: Vec<(String, ForeignKeyDescriptor)> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some((name, fk)) if *name == row.constraint_name => {
                if let Some(column) = fk.column.as_mut() {
                    column.push_str(", ");
                    column.push_str(&row.column);
                }
                if let Some(column) = fk.referenced_column.as_mut() {
                    column.push_str(", ");
                    column.push_str(&row.referenced_column);
                }
            }
            _ => {
                let fk = ForeignKeyDescriptor::new(row.referenced_table)
                    .with_columns(row.column, row.referenced_column);
                grouped.push((row.constraint_name, fk));
            }
        }
    }
    grouped.into_iter().map(|(_, fk)| fk).collect()
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            format_type(a.atttypid, a.atttypmod) AS column_type
        FROM information_schema.columns c
        JOIN pg_namespace n ON n.nspname = c.table_schema
        JOIN pg_class t ON t.relname = c.table_name AND t.relnamespace = n.oid
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        WHERE c.table_name = $1 AND c.table_schema = current_schema()
        ORDER BY c.ordinal_position
        "#;

        // Tables in another schema are qualified so they never collide with local names.
        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            con.conname::text AS constraint_name,
            CASE WHEN refns.nspname = current_schema() THEN ref.relname::text
                 ELSE refns.nspname::text || '.' || ref.relname::text
            END AS foreign_table_name,
            a.attname::text AS column_name,
            af.attname::text AS foreign_column_name
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_class ref ON ref.oid = con.confrelid
        JOIN pg_namespace refns ON refns.oid = ref.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, fattnum, ord)
        JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
        JOIN pg_attribute af ON af.attrelid = con.confrelid AND af.attnum = k.fattnum
        WHERE con.contype = 'f'
        AND t.relname = $1
        AND n.nspname = current_schema()
        ORDER BY con.conname, k.ord
        "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8mb4) AS COLUMN_TYPE
        FROM information_schema.COLUMNS
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        ORDER BY ORDINAL_POSITION
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(CONSTRAINT_NAME USING utf8mb4) AS CONSTRAINT_NAME,
            CONVERT(
                IF(REFERENCED_TABLE_SCHEMA = DATABASE(), REFERENCED_TABLE_NAME,
                   CONCAT(REFERENCED_TABLE_SCHEMA, '.', REFERENCED_TABLE_NAME))
                USING utf8mb4) AS REFERENCED_TABLE_NAME,
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(REFERENCED_COLUMN_NAME USING utf8mb4) AS REFERENCED_COLUMN_NAME
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_NAME = ?
        AND TABLE_SCHEMA = DATABASE()
        AND REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
        "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn inspect(pool: &PgPool) -> Result<Vec<TableDescriptor>, sqlx::Error> {
        let names: Vec<String> = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| row.try_get("table_name"))
            .collect::<Result<_, _>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let mut table = TableDescriptor::new(&name);
            table.columns = fetch_columns(pool, &name).await?;
            table.foreign_keys = group_foreign_keys(fetch_foreign_keys(pool, &name).await?);
            tables.push(table);
        }
        debug!(count = tables.len(), "Inspected PostgreSQL tables");
        Ok(tables)
    }

    async fn fetch_columns(
        pool: &PgPool,
        table_name: &str,
    ) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| {
                Ok(ColumnDescriptor::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("column_type")?,
                ))
            })
            .collect()
    }

    async fn fetch_foreign_keys(
        pool: &PgPool,
        table_name: &str,
    ) -> Result<Vec<ForeignKeyColumnRow>, sqlx::Error> {
        sqlx::query(queries::postgres::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| {
                Ok(ForeignKeyColumnRow {
                    constraint_name: row.try_get("constraint_name")?,
                    referenced_table: row.try_get("foreign_table_name")?,
                    column: row.try_get("column_name")?,
                    referenced_column: row.try_get("foreign_column_name")?,
                })
            })
            .collect()
    }
}

mod mysql {
    use super::*;
    use sqlx::mysql::MySqlRow;
    use sqlx::{MySqlPool, Row};

    /// Get a string column, accepting VARBINARY as returned under some charset settings.
    fn get_string(row: &MySqlRow, column: &str) -> Result<String, sqlx::Error> {
        match row.try_get::<String, _>(column) {
            Ok(s) => Ok(s),
            Err(err) => row
                .try_get::<Vec<u8>, _>(column)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .ok_or(err),
        }
    }

    pub async fn inspect(pool: &MySqlPool) -> Result<Vec<TableDescriptor>, sqlx::Error> {
        let names: Vec<String> = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| get_string(row, "TABLE_NAME"))
            .collect::<Result<_, _>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let mut table = TableDescriptor::new(&name);
            table.columns = fetch_columns(pool, &name).await?;
            table.foreign_keys = group_foreign_keys(fetch_foreign_keys(pool, &name).await?);
            tables.push(table);
        }
        debug!(count = tables.len(), "Inspected MySQL tables");
        Ok(tables)
    }

    async fn fetch_columns(
        pool: &MySqlPool,
        table_name: &str,
    ) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| {
                Ok(ColumnDescriptor::new(
                    get_string(row, "COLUMN_NAME")?,
                    get_string(row, "COLUMN_TYPE")?,
                ))
            })
            .collect()
    }

    async fn fetch_foreign_keys(
        pool: &MySqlPool,
        table_name: &str,
    ) -> Result<Vec<ForeignKeyColumnRow>, sqlx::Error> {
        sqlx::query(queries::mysql::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| {
                Ok(ForeignKeyColumnRow {
                    constraint_name: get_string(row, "CONSTRAINT_NAME")?,
                    referenced_table: get_string(row, "REFERENCED_TABLE_NAME")?,
                    column: get_string(row, "COLUMN_NAME")?,
                    referenced_column: get_string(row, "REFERENCED_COLUMN_NAME")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk_row(name: &str, table: &str, column: &str, referenced: &str) -> ForeignKeyColumnRow {
        ForeignKeyColumnRow {
            constraint_name: name.to_string(),
            referenced_table: table.to_string(),
            column: column.to_string(),
            referenced_column: referenced.to_string(),
        }
    }

    #[test]
    fn test_group_foreign_keys_one_per_constraint() {
        let grouped = group_foreign_keys(vec![
            fk_row("orders_user_fk", "users", "user_id", "id"),
            fk_row("orders_item_fk", "items", "item_id", "id"),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].referenced_table, "users");
        assert_eq!(grouped[1].column.as_deref(), Some("item_id"));
    }

    #[test]
    fn test_group_foreign_keys_composite() {
        let grouped = group_foreign_keys(vec![
            fk_row("line_fk", "order_lines", "order_id", "order_id"),
            fk_row("line_fk", "order_lines", "line_no", "line_no"),
        ]);
        assert_eq!(
            grouped,
            vec![
                ForeignKeyDescriptor::new("order_lines")
                    .with_columns("order_id, line_no", "order_id, line_no")
            ]
        );
    }

    #[test]
    fn test_group_foreign_keys_keeps_parallel_edges() {
        let grouped = group_foreign_keys(vec![
            fk_row("msg_sender_fk", "users", "sender_id", "id"),
            fk_row("msg_recipient_fk", "users", "recipient_id", "id"),
        ]);
        assert_eq!(grouped.len(), 2);
        assert!(grouped.iter().all(|fk| fk.referenced_table == "users"));
    }

    #[test]
    fn test_group_foreign_keys_empty() {
        assert!(group_foreign_keys(Vec::new()).is_empty());
    }
}
