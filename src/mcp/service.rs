//! MCP service implementation using rmcp.
//!
//! This module defines the TalkToSqlService struct with the session tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::models::PipelineRun;
use crate::session::SharedSession;
use crate::tools::{
    AskInput, AskToolHandler, ConnectServerInput, ConnectServerOutput, ConnectionToolHandler,
    DiagramToolHandler, DisconnectOutput, ListDatabasesOutput, SchemaDiagramInput,
    SchemaDiagramOutput, SelectDatabaseInput, SelectDatabaseOutput,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct TalkToSqlService {
    /// Session shared by all tool calls
    session: SharedSession,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl TalkToSqlService {
    pub fn new(session: SharedSession) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TalkToSqlService {
    #[tool(
        description = "Connect to a PostgreSQL or MySQL server and list its databases.\nReplaces any previous connection. System databases are not listed.\nOptionally selects `database` right away."
    )]
    async fn connect_server(
        &self,
        Parameters(input): Parameters<ConnectServerInput>,
    ) -> Result<Json<ConnectServerOutput>, McpError> {
        let handler = ConnectionToolHandler::new(self.session.clone());
        handler
            .connect_server(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(description = "List the databases of the connected server.")]
    async fn list_databases(&self) -> Result<Json<ListDatabasesOutput>, McpError> {
        let handler = ConnectionToolHandler::new(self.session.clone());
        handler
            .list_databases()
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Select a database from list_databases.\nIntrospects its tables, columns and foreign keys and returns the schema summary used for questions.\nOn failure the previous selection stays active."
    )]
    async fn select_database(
        &self,
        Parameters(input): Parameters<SelectDatabaseInput>,
    ) -> Result<Json<SelectDatabaseOutput>, McpError> {
        let handler = ConnectionToolHandler::new(self.session.clone());
        handler
            .select_database(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Ask a question about the selected database in natural language.\nGenerates one read-only SQL query, runs it and returns the SQL with the answer.\nIf the SQL fails, `error` holds the database's message and `sql` the statement that was tried."
    )]
    async fn ask(
        &self,
        Parameters(input): Parameters<AskInput>,
    ) -> Result<Json<PipelineRun>, McpError> {
        let handler = AskToolHandler::new(self.session.clone());
        handler.ask(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Diagram of the selected database: one node per table listing its columns, one edge per foreign key.\nFormat \"dot\" (default) returns Graphviz source, \"json\" returns node and edge lists."
    )]
    async fn schema_diagram(
        &self,
        Parameters(input): Parameters<SchemaDiagramInput>,
    ) -> Result<Json<SchemaDiagramOutput>, McpError> {
        let handler = DiagramToolHandler::new(self.session.clone());
        handler
            .schema_diagram(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Close the server connection and forget the catalog, schema and last answer."
    )]
    async fn disconnect(&self) -> Json<DisconnectOutput> {
        let handler = ConnectionToolHandler::new(self.session.clone());
        Json(handler.disconnect().await)
    }
}

#[tool_handler]
impl ServerHandler for TalkToSqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "talk-to-sql".to_owned(),
                title: Some("Talk to SQL".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ask questions about a SQL database in natural language.\n\
                \n\
                ## Workflow\n\
                1. Call `connect_server` with engine, host, user and password\n\
                2. Pick a name from the returned databases and call `select_database`\n\
                3. Call `ask` with a question; the answer comes with the SQL that produced it\n\
                4. Call `schema_diagram` to see tables and their foreign keys\n\
                \n\
                ## Notes\n\
                - Only read-only queries are executed.\n\
                - Each question is answered independently; earlier questions are not remembered.\n\
                - A failed step keeps the current connection and database; retry or rephrase."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineOptions, PoolOptions};
    use crate::error::{AppError, AppResult};
    use crate::llm::CompletionBackend;
    use crate::session::Session;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Unused;

    #[async_trait]
    impl CompletionBackend for Unused {
        async fn complete(&self, _prompt: &str) -> AppResult<String> {
            Err(AppError::translation("unused"))
        }

        fn name(&self) -> &str {
            "unused"
        }
    }

    fn create_test_service() -> TalkToSqlService {
        let session = Session::new(
            Arc::new(Unused),
            PoolOptions::default(),
            PipelineOptions::default(),
        );
        TalkToSqlService::new(session.into_shared())
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "talk-to-sql");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_list_databases_without_server() {
        let service = create_test_service();
        let err = service.list_databases().await.err().unwrap();
        assert_eq!(err.code.0, -32002);
    }

    #[tokio::test]
    async fn test_disconnect_without_server() {
        let service = create_test_service();
        let Json(output) = service.disconnect().await;
        assert!(!output.disconnected);
    }
}
