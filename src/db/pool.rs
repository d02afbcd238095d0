//! Connection pool management.
//!
//! Database-specific pools (MySqlPool, PgPool) are used instead of `AnyPool`
//! to keep full type support when decoding result rows.

use crate::config::PoolOptions;
use crate::error::{AppError, AppResult};
use crate::models::{ConnectionTarget, DatabaseType};
use sqlx::{
    MySqlPool, PgPool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    postgres::PgPoolOptions,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
}

impl DbPool {
    /// Open a pool for the given target.
    ///
    /// Without a database on the target this is a server-level pool (see
    /// [`ConnectionTarget::connection_string`]).
    pub async fn connect(target: &ConnectionTarget, options: &PoolOptions) -> AppResult<Self> {
        info!(
            engine = %target.engine,
            url = %target.masked_connection_string(),
            "Connecting to database"
        );

        let connection_string = target.connection_string();
        let pool = match target.engine {
            DatabaseType::MySQL => {
                let connect_options = MySqlConnectOptions::from_str(&connection_string)
                    .map_err(|e| {
                        AppError::connection(
                            format!("Invalid MySQL connection parameters: {}", e),
                            "Check the host, user and password",
                        )
                    })?
                    .charset("utf8mb4");

                let pool = MySqlPoolOptions::new()
                    .max_connections(options.max_connections)
                    .acquire_timeout(options.acquire_timeout())
                    .idle_timeout(Some(options.idle_timeout()))
                    .connect_with(connect_options)
                    .await
                    .map_err(|e| connect_error(target.engine, &e))?;
                DbPool::MySql(pool)
            }
            DatabaseType::PostgreSQL => {
                let pool = PgPoolOptions::new()
                    .max_connections(options.max_connections)
                    .acquire_timeout(options.acquire_timeout())
                    .idle_timeout(Some(options.idle_timeout()))
                    .connect(&connection_string)
                    .await
                    .map_err(|e| connect_error(target.engine, &e))?;
                DbPool::Postgres(pool)
            }
        };

        if let Some(version) = pool.server_version().await {
            info!(version = %version, "Connected successfully");
        }
        Ok(pool)
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySQL,
            DbPool::Postgres(_) => DatabaseType::PostgreSQL,
        }
    }

    /// Get the server version, if the server reports one.
    pub async fn server_version(&self) -> Option<String> {
        let result = match self {
            DbPool::MySql(pool) => {
                sqlx::query_scalar::<_, String>("SELECT version()")
                    .fetch_one(pool)
                    .await
            }
            DbPool::Postgres(pool) => {
                sqlx::query_scalar::<_, String>("SELECT version()")
                    .fetch_one(pool)
                    .await
            }
        };
        match result {
            Ok(version) => {
                debug!(version = %version, "Got server version");
                Some(version)
            }
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }
}

fn connect_error(engine: DatabaseType, error: &sqlx::Error) -> AppError {
    AppError::connection(
        format!("Failed to connect: {}", error),
        connection_suggestion(engine, error),
    )
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(engine: DatabaseType, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!("Check that the {} server is running and accessible", engine);
    }

    if error_str.contains("authentication")
        || error_str.contains("password")
        || error_str.contains("access denied")
    {
        return "Verify the user and password".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unknown database") {
        return "Check that the database exists, then reconnect to refresh the catalog".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    if matches!(error, sqlx::Error::PoolTimedOut) {
        return "The server did not answer in time; check the host and port".to_string();
    }

    match engine {
        DatabaseType::PostgreSQL => "Verify the host (host[:5432]) and credentials".to_string(),
        DatabaseType::MySQL => "Verify the host (host[:3306]) and credentials".to_string(),
    }
}
