//! Catalog discovery.
//!
//! Lists the databases on a connected server. System and template databases
//! are removed by [`DatabaseCatalog::from_names`].

use crate::db::pool::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::DatabaseCatalog;
use sqlx::Row;
use tracing::debug;

mod queries {
    pub const POSTGRES_LIST_DATABASES: &str =
        "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname";

    pub const MYSQL_LIST_DATABASES: &str = "SHOW DATABASES";
}

/// Run the engine's catalog query on a server-level pool.
///
/// Any failure here is a connection failure: the server was reached but could
/// not be used.
pub async fn list_databases(pool: &DbPool) -> AppResult<DatabaseCatalog> {
    let names = match pool {
        DbPool::Postgres(p) => {
            let rows = sqlx::query(queries::POSTGRES_LIST_DATABASES)
                .fetch_all(p)
                .await
                .map_err(catalog_error)?;
            rows.iter()
                .filter_map(|row| row.try_get::<String, _>(0).ok())
                .collect::<Vec<_>>()
        }
        DbPool::MySql(p) => {
            let rows = sqlx::query(queries::MYSQL_LIST_DATABASES)
                .fetch_all(p)
                .await
                .map_err(catalog_error)?;
            // SHOW DATABASES may come back as VARBINARY depending on charset settings
            rows.iter()
                .filter_map(|row| {
                    row.try_get::<String, _>(0).ok().or_else(|| {
                        row.try_get::<Vec<u8>, _>(0)
                            .ok()
                            .and_then(|bytes| String::from_utf8(bytes).ok())
                    })
                })
                .collect::<Vec<_>>()
        }
    };

    let raw_count = names.len();
    let catalog = DatabaseCatalog::from_names(names);
    debug!(
        raw = raw_count,
        listed = catalog.len(),
        engine = %pool.db_type(),
        "Listed databases"
    );
    Ok(catalog)
}

fn catalog_error(err: sqlx::Error) -> AppError {
    AppError::connection(
        format!("Failed to list databases: {}", err),
        "Check that the user may list databases on this server",
    )
}
