//! Error types for talk-to-sql.
//!
//! Every pipeline stage reports failures through [`AppError`]. Each variant
//! carries a message meant for the person asking the question, and most carry
//! a suggestion describing how to recover (reconnect, rephrase, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Server unreachable or credentials rejected during connect or catalog discovery.
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// Schema enumeration failed after a database was selected.
    #[error("Schema introspection failed for '{database}': {message}")]
    Introspection { database: String, message: String },

    /// Completion backend unreachable, errored, or returned unusable text.
    #[error("Translation failed: {message}")]
    Translation { message: String },

    /// Candidate SQL was empty after cleanup. Shown to users as a translation failure.
    #[error("Translation failed: the model response contained no SQL ({message})")]
    Extraction { message: String },

    /// The generated statement failed to run. `message` is the backend text, verbatim.
    #[error("{message}")]
    Execution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Not connected to a database server")]
    NoServer,

    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an introspection error for the given database.
    pub fn introspection(database: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Introspection {
            database: database.into(),
            message: message.into(),
        }
    }

    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an execution error carrying the backend message and optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the recovery suggestion for this error, if any.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Introspection { .. } => {
                Some("Check that the user may read the database catalog, then select it again")
            }
            Self::Translation { .. } | Self::Extraction { .. } => {
                Some("Ask the question again or rephrase it")
            }
            Self::Execution { .. } => {
                Some("Review the generated SQL and rephrase the question if it is wrong")
            }
            Self::NoServer => Some("Connect to a server first"),
            Self::NoDatabaseSelected => Some("Select a database from the catalog first"),
            _ => None,
        }
    }

    /// SQLSTATE reported by the server for an execution failure.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for talk-to-sql operations.
pub type AppResult<T> = Result<T, AppError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert AppError to MCP ErrorData for semantic error categorization.
impl From<AppError> for rmcp::ErrorData {
    fn from(err: AppError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            AppError::InvalidInput { .. } | AppError::Execution { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }
            AppError::NoServer | AppError::NoDatabaseSelected => {
                rmcp::ErrorData::resource_not_found(err.to_string(), data)
            }
            AppError::Connection { .. }
            | AppError::Introspection { .. }
            | AppError::Translation { .. }
            | AppError::Extraction { .. }
            | AppError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
