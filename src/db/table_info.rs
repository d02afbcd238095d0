//! Textual schema summary used in the translation prompt.
//!
//! Each table is written as a `CREATE TABLE` statement followed by a comment
//! block with a few sample rows:
//!
//! ```text
//! CREATE TABLE "orders" (
//! 	"id" integer,
//! 	"user_id" integer,
//! 	FOREIGN KEY("user_id") REFERENCES "users"("id")
//! )
//!
//! /*
//! 2 rows from orders table:
//! id	user_id
//! 1	7
//! 2	9
//! */
//! ```

use crate::db::executor::{FetchedRows, fetch_cells};
use crate::db::pool::DbPool;
use crate::models::{DatabaseType, SchemaGraph, TableDescriptor};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Longer sample values are cut to this many characters.
const MAX_SAMPLE_VALUE_CHARS: usize = 100;

/// Build the prompt summary for every table of `graph`.
///
/// Sample rows are best effort: a table whose sample query fails is still
/// described, just without rows.
pub async fn describe_schema(
    pool: &DbPool,
    graph: &SchemaGraph,
    sample_rows: u32,
    query_timeout: Duration,
) -> String {
    let engine = pool.db_type();
    let mut sections = Vec::with_capacity(graph.tables.len());

    for table in &graph.tables {
        let mut section = create_table_text(table, graph, engine);
        if sample_rows > 0 {
            let sql = format!(
                "SELECT * FROM {} LIMIT {}",
                quote_ident(&table.name, engine),
                sample_rows
            );
            match fetch_cells(pool, &sql, sample_rows, query_timeout).await {
                Ok(fetched) => {
                    section.push_str("\n\n");
                    section.push_str(&sample_block(&table.name, &fetched));
                }
                Err(e) => warn!(
                    table = %table.name,
                    error = %e,
                    "Skipping sample rows"
                ),
            }
        }
        sections.push(section);
    }

    debug!(
        database = %graph.database,
        tables = sections.len(),
        "Built schema summary"
    );
    sections.join("\n\n")
}

/// `CREATE TABLE` form of one table, including its foreign keys.
pub fn create_table_text(
    table: &TableDescriptor,
    graph: &SchemaGraph,
    engine: DatabaseType,
) -> String {
    let known = graph.table_names();
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("\t{} {}", quote_ident(&c.name, engine), c.declared_type))
        .collect();

    for fk in &table.foreign_keys {
        let target = quote_reference(&fk.referenced_table, &known, engine);
        let line = match (&fk.column, &fk.referenced_column) {
            (Some(column), Some(referenced)) => format!(
                "\tFOREIGN KEY({}) REFERENCES {}({})",
                quote_list(column, engine),
                target,
                quote_list(referenced, engine)
            ),
            _ => format!("\tREFERENCES {}", target),
        };
        lines.push(line);
    }

    if lines.is_empty() {
        format!("CREATE TABLE {} ()", quote_ident(&table.name, engine))
    } else {
        format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_ident(&table.name, engine),
            lines.join(",\n")
        )
    }
}

fn sample_block(table: &str, fetched: &FetchedRows) -> String {
    let mut out = format!("/*\n{} rows from {} table:\n", fetched.rows.len(), table);
    out.push_str(&fetched.columns.join("\t"));
    for row in &fetched.rows {
        out.push('\n');
        let values: Vec<String> = row
            .iter()
            .map(|cell| truncate_chars(&cell.to_string(), MAX_SAMPLE_VALUE_CHARS))
            .collect();
        out.push_str(&values.join("\t"));
    }
    out.push_str("\n*/");
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Quote an identifier for the engine, doubling embedded quote characters.
pub fn quote_ident(name: &str, engine: DatabaseType) -> String {
    match engine {
        DatabaseType::PostgreSQL => format!("\"{}\"", name.replace('"', "\"\"")),
        DatabaseType::MySQL => format!("`{}`", name.replace('`', "``")),
    }
}

/// Referenced tables outside the graph are schema-qualified (`schema.table`).
fn quote_reference(name: &str, known: &HashSet<&str>, engine: DatabaseType) -> String {
    if known.contains(name) {
        return quote_ident(name, engine);
    }
    name.split('.')
        .map(|part| quote_ident(part, engine))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote each name of a comma-joined column list.
fn quote_list(columns: &str, engine: DatabaseType) -> String {
    columns
        .split(", ")
        .map(|c| quote_ident(c, engine))
        .collect::<Vec<_>>()
        .join(", ")
}
