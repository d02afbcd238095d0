//! Connection tools.
//!
//! This module implements the `connect_server`, `list_databases`,
//! `select_database` and `disconnect` MCP tools.

use crate::error::{AppError, AppResult};
use crate::models::{ConnectionTarget, DanglingReference, DatabaseType};
use crate::session::{Session, SharedSession};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Input for the connect_server tool.
#[derive(Deserialize, JsonSchema)]
pub struct ConnectServerInput {
    /// Database engine: "postgresql" or "mysql"
    pub engine: DatabaseType,
    /// Server host, optionally with ":port"
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Select this database right after connecting.
    #[serde(default)]
    pub database: Option<String>,
}

impl std::fmt::Debug for ConnectServerInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectServerInput")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}

/// Databases available on the connected server.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    pub count: usize,
}

/// Output for the connect_server tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConnectServerOutput {
    pub engine: DatabaseType,
    pub host: String,
    pub databases: Vec<String>,
    pub count: usize,
    /// Present when a database was requested and selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectDatabaseOutput>,
}

/// Input for the select_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectDatabaseInput {
    /// Database name from list_databases
    pub database: String,
}

/// Output for the select_database tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SelectDatabaseOutput {
    pub database: String,
    pub tables: Vec<String>,
    pub foreign_keys: usize,
    /// Foreign keys pointing at tables outside the database's default schema.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dangling_references: Vec<DanglingReference>,
    /// Schema summary sent to the model with each question.
    pub schema_summary: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DisconnectOutput {
    /// False when there was nothing to disconnect.
    pub disconnected: bool,
}

/// Handler for connection tools.
pub struct ConnectionToolHandler {
    session: SharedSession,
}

impl ConnectionToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub async fn connect_server(
        &self,
        input: ConnectServerInput,
    ) -> AppResult<ConnectServerOutput> {
        info!(
            engine = %input.engine,
            host = %input.host,
            user = %input.user,
            "Tool: connect_server called"
        );
        let target = ConnectionTarget::new(input.engine, input.host, input.user, input.password);
        self.connect_target(target, input.database.as_deref()).await
    }

    /// Connect, then optionally select a database.
    ///
    /// A failed selection is reported as an error while the server stays connected.
    pub async fn connect_target(
        &self,
        target: ConnectionTarget,
        database: Option<&str>,
    ) -> AppResult<ConnectServerOutput> {
        let mut session = self.session.lock().await;
        let engine = target.engine;
        let host = target.host.clone();
        let databases = session.connect_server(target).await?.names().to_vec();

        let selected = match database {
            Some(name) => Some(select(&mut session, name).await?),
            None => None,
        };

        Ok(ConnectServerOutput {
            engine,
            host,
            count: databases.len(),
            databases,
            selected,
        })
    }

    pub async fn list_databases(&self) -> AppResult<ListDatabasesOutput> {
        info!("Tool: list_databases called");
        let session = self.session.lock().await;
        let catalog = session.catalog().ok_or(AppError::NoServer)?;
        Ok(ListDatabasesOutput {
            databases: catalog.names().to_vec(),
            count: catalog.len(),
        })
    }

    pub async fn select_database(
        &self,
        input: SelectDatabaseInput,
    ) -> AppResult<SelectDatabaseOutput> {
        info!(database = %input.database, "Tool: select_database called");
        let mut session = self.session.lock().await;
        select(&mut session, input.database.trim()).await
    }

    pub async fn disconnect(&self) -> DisconnectOutput {
        info!("Tool: disconnect called");
        let mut session = self.session.lock().await;
        let disconnected = session.server().is_some();
        session.disconnect().await;
        DisconnectOutput { disconnected }
    }
}

async fn select(session: &mut Session, name: &str) -> AppResult<SelectDatabaseOutput> {
    let selected = session.select_database(name).await?;
    Ok(SelectDatabaseOutput {
        database: selected.name.clone(),
        tables: selected.graph.tables.iter().map(|t| t.name.clone()).collect(),
        foreign_keys: selected.graph.edge_count(),
        dangling_references: selected.graph.dangling_references(),
        schema_summary: selected.schema_text.clone(),
    })
}
