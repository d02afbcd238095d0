//! Statement guard for generated SQL.
//!
//! Generated statements are checked before they reach the server:
//! exactly one statement, and nothing that writes or changes server state.
//! Text that sqlparser cannot parse is let through so the server can report
//! the real syntax error.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) so the check cannot be
//! bypassed through formatting tricks or comments.

use crate::error::{AppError, AppResult};
use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use tracing::debug;

/// What the guard learned about a statement it allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Parsed as a single read-only statement.
    ReadOnly,
    /// Could not be parsed locally; the server decides.
    Unparsed,
}

/// Get the appropriate SQL dialect for the given database type.
fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
    }
}

/// Remove surrounding whitespace and at most one trailing `;`.
pub fn strip_trailing_semicolon(sql: &str) -> &str {
    let trimmed = sql.trim();
    trimmed
        .strip_suffix(';')
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// Check that `sql` is a single read-only statement.
///
/// Violations are reported as execution failures so they are shown next to
/// the generated SQL like any other server-side error.
pub fn check_statement(sql: &str, db_type: DatabaseType) -> AppResult<GuardOutcome> {
    let dialect = get_dialect(db_type);

    let statements = match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(statements) => statements,
        Err(e) => {
            debug!(error = %e, "Statement did not parse locally, deferring to server");
            return Ok(GuardOutcome::Unparsed);
        }
    };

    match statements.as_slice() {
        [] => Err(AppError::execution("No SQL statement to execute", None)),
        [statement] => {
            if is_read_only(statement) {
                Ok(GuardOutcome::ReadOnly)
            } else {
                Err(AppError::execution(
                    format!(
                        "{} statements are not allowed: only read-only queries are executed",
                        leading_keyword(sql)
                    ),
                    None,
                ))
            }
        }
        many => Err(AppError::execution(
            format!(
                "Only one statement can be executed per question, found {}",
                many.len()
            ),
            None,
        )),
    }
}

/// Read-only statements: queries, SHOW variants and EXPLAIN of a read-only statement.
fn is_read_only(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(_)
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowDatabases { .. }
        | Statement::ShowSchemas { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowVariables { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. }
        | Statement::ExplainTable { .. } => true,
        // EXPLAIN ANALYZE runs the statement, so the inner statement decides
        Statement::Explain { statement, .. } => is_read_only(statement),
        _ => false,
    }
}

/// First keyword of the statement, upper-cased, for error messages.
fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphabetic()))
        .filter(|w| !w.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "Non-query".to_string())
}
