//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Catalog discovery
//! - Schema introspection and the prompt's schema summary
//! - Query execution and row decoding

pub mod catalog;
pub mod executor;
pub mod pool;
pub mod schema;
pub mod table_info;
pub mod types;

pub use catalog::list_databases;
pub use executor::{FetchedRows, QueryExecutor, fetch_cells};
pub use pool::DbPool;
pub use schema::SchemaInspector;
pub use table_info::{create_table_text, describe_schema, quote_ident};
