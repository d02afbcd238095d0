//! MCP tool implementations.
//!
//! This module contains the session tool handlers:
//! - `connect_server`: Connect to a server and load its catalog
//! - `list_databases`: List the catalog of the connected server
//! - `select_database`: Introspect a database and make it current
//! - `ask`: Answer a question with generated SQL
//! - `schema_diagram`: Diagram of the selected database
//! - `disconnect`: Drop the connection and all session state

pub mod ask;
pub mod connection;
pub mod diagram;

pub use ask::{AskInput, AskToolHandler};
pub use connection::{
    ConnectServerInput, ConnectServerOutput, ConnectionToolHandler, DisconnectOutput,
    ListDatabasesOutput, SelectDatabaseInput, SelectDatabaseOutput,
};
pub use diagram::{DiagramFormat, DiagramToolHandler, SchemaDiagramInput, SchemaDiagramOutput};
