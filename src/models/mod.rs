//! Data models for talk-to-sql.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionTarget, DatabaseCatalog, DatabaseType, SYSTEM_DATABASES};
pub use query::{
    Cell, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, PipelineRun, QueryOutcome,
    RawResult, SqlCandidate, TranslationRequest,
};
pub use schema::{
    ColumnDescriptor, DanglingReference, ForeignKeyDescriptor, SchemaGraph, TableDescriptor,
};
