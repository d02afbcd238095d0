//! Talk to SQL Library
//!
//! Answers natural-language questions about a PostgreSQL or MySQL database:
//! the question and a schema summary go to a text-completion backend, the
//! returned SQL runs against the selected database, and the rows come back as
//! a readable answer. A diagram of the schema's tables and foreign keys is
//! built alongside. Everything is exposed as MCP tools.

pub mod config;
pub mod db;
pub mod diagram;
pub mod error;
pub mod format;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod sql;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use mcp::TalkToSqlService;
pub use session::{Session, SharedSession};
