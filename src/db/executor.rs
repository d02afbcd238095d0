//! Query execution engine.
//!
//! Runs one generated statement against the selected database and renders the
//! fetched rows as a row-tuple literal:
//! - the statement passes through the read-only guard first
//! - it is sent as a single prepared statement, so chained statements are rejected by the server
//! - only `limit + 1` rows are pulled from the stream to detect truncation
//! - the whole fetch runs under a timeout
//!
//! Every failure is reported as [`AppError::Execution`] with the server's text
//! unchanged; nothing is retried or rewritten.

use crate::db::pool::DbPool;
use crate::db::types::RowToCells;
use crate::error::{AppError, AppResult};
use crate::format::literal::render_rows;
use crate::models::{
    Cell, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, RawResult, SqlCandidate,
};
use crate::sql::{check_statement, strip_trailing_semicolon};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Rows pulled from one statement.
#[derive(Debug, Clone, Default)]
pub struct FetchedRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// More rows were available than the limit allowed.
    pub truncated: bool,
}

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    default_timeout: Duration,
    default_limit: u32,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            default_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Create a new query executor with custom settings.
    pub fn with_defaults(query_timeout: Duration, row_limit: u32) -> Self {
        Self {
            default_timeout: query_timeout,
            default_limit: row_limit.clamp(1, MAX_ROW_LIMIT),
        }
    }

    /// Run a generated statement and return its rows as a literal.
    pub async fn execute(&self, pool: &DbPool, candidate: &SqlCandidate) -> AppResult<RawResult> {
        let sql = strip_trailing_semicolon(candidate.as_str());
        let guard = check_statement(sql, pool.db_type())?;

        debug!(
            sql = %sql,
            guard = ?guard,
            limit = self.default_limit,
            timeout_secs = self.default_timeout.as_secs(),
            "Executing query"
        );

        let start = Instant::now();
        let fetched = fetch_cells(pool, sql, self.default_limit, self.default_timeout).await?;
        if fetched.truncated {
            warn!(limit = self.default_limit, "Query result truncated");
        }
        debug!(
            rows = fetched.rows.len(),
            columns = fetched.columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );

        Ok(RawResult(render_rows(&fetched.rows)))
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch at most `limit` rows of `sql` as cells.
///
/// Used for answers and for the sample rows of the schema summary.
pub async fn fetch_cells(
    pool: &DbPool,
    sql: &str,
    limit: u32,
    query_timeout: Duration,
) -> AppResult<FetchedRows> {
    match pool {
        DbPool::MySql(p) => {
            let rows = mysql::fetch_rows(p, sql, limit, query_timeout).await?;
            process_rows(rows, limit)
        }
        DbPool::Postgres(p) => {
            let rows = postgres::fetch_rows(p, sql, limit, query_timeout).await?;
            process_rows(rows, limit)
        }
    }
}

fn process_rows<R: RowToCells>(rows: Vec<R>, limit: u32) -> AppResult<FetchedRows> {
    let Some(first) = rows.first() else {
        return Ok(FetchedRows::default());
    };
    let columns = first.column_names();
    let truncated = rows.len() > limit as usize;
    let rows = rows
        .iter()
        .take(limit as usize)
        .map(RowToCells::to_cells)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(FetchedRows {
        columns,
        rows,
        truncated,
    })
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> AppResult<Vec<R>> {
    results
        .into_iter()
        .map(|r| r.map_err(execution_error))
        .collect()
}

/// Server errors keep their message verbatim; anything else uses its display text.
fn execution_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string());
            AppError::execution(db_err.message(), code)
        }
        other => AppError::execution(other.to_string(), None),
    }
}

fn timeout_error(query_timeout: Duration) -> AppError {
    AppError::execution(
        format!(
            "Query did not finish within {}s and was cancelled",
            query_timeout.as_secs()
        ),
        None,
    )
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::MySqlRow;

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> AppResult<Vec<MySqlRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = sqlx::query(sql)
            .fetch(pool)
            .take(fetch_limit)
            .collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error(query_timeout)),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> AppResult<Vec<PgRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = sqlx::query(sql)
            .fetch(pool)
            .take(fetch_limit)
            .collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error(query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
        assert_eq!(executor.default_limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = QueryExecutor::with_defaults(Duration::from_secs(60), 500);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
    }

    #[test]
    fn test_executor_limit_clamped() {
        let executor = QueryExecutor::with_defaults(Duration::from_secs(30), 99999);
        assert_eq!(executor.default_limit, MAX_ROW_LIMIT);
        let executor = QueryExecutor::with_defaults(Duration::from_secs(30), 0);
        assert_eq!(executor.default_limit, 1);
    }

    #[test]
    fn test_non_database_errors_become_execution_failures() {
        let err = execution_error(sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::Execution { .. }));
        assert_eq!(err.to_string(), sqlx::Error::PoolClosed.to_string());
    }

    #[test]
    fn test_timeout_is_execution_failure() {
        let err = timeout_error(Duration::from_secs(5));
        assert!(matches!(err, AppError::Execution { .. }));
        assert!(err.to_string().contains("5s"));
    }

    /// Row whose second column cannot be read.
    struct FakeRow {
        readable: bool,
    }

    impl RowToCells for FakeRow {
        fn to_cells(&self) -> AppResult<Vec<Cell>> {
            if self.readable {
                Ok(vec![Cell::number(1), Cell::text("a")])
            } else {
                Err(AppError::execution(
                    "Cannot read column 'span' of type tsrange: unsupported",
                    None,
                ))
            }
        }

        fn column_names(&self) -> Vec<String> {
            vec!["id".to_string(), "span".to_string()]
        }
    }

    #[test]
    fn test_process_rows_truncates_at_limit() {
        let rows = (0..3).map(|_| FakeRow { readable: true }).collect();
        let fetched = process_rows(rows, 2).unwrap();
        assert_eq!(fetched.columns, ["id", "span"]);
        assert_eq!(fetched.rows.len(), 2);
        assert!(fetched.truncated);
    }

    #[test]
    fn test_unreadable_value_fails_the_query() {
        let rows = vec![FakeRow { readable: true }, FakeRow { readable: false }];
        let err = process_rows(rows, 10).unwrap_err();
        assert!(matches!(err, AppError::Execution { .. }));
        assert!(err.to_string().contains("tsrange"));
    }
}
