//! Query-related data models.
//!
//! These are the values passed between pipeline stages for a single question.
//! None of them outlive the question that produced them.

use schemars::JsonSchema;
use serde::Serialize;

/// Default row limit for query results.
pub const DEFAULT_ROW_LIMIT: u32 = 1000;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Inputs for one translation.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub question: String,
    pub schema_text: String,
}

impl TranslationRequest {
    pub fn new(question: impl Into<String>, schema_text: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            schema_text: schema_text.into(),
        }
    }
}

/// A single trimmed SQL statement with fencing and surrounding prose removed.
///
/// Never empty: [`SqlCandidate::new`] rejects blank input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCandidate(String);

impl SqlCandidate {
    /// Wrap an already-extracted statement. Returns `None` when it is blank.
    pub fn new(sql: impl Into<String>) -> Option<Self> {
        let sql = sql.into();
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == sql.len() {
            Some(Self(sql))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SqlCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Textual output of the query executor.
///
/// Row results are rendered as a row-tuple literal such as `[('Alice',), ('Bob',)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult(pub String);

impl RawResult {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawResult {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One field of a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Null,
    Bool(bool),
    /// Numeric text exactly as the server produced it (`42`, `-1.50`, `1e-3`).
    Number(String),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn number(n: impl ToString) -> Self {
        Self::Number(n.to_string())
    }
}

/// Answer-style rendering: text unquoted, NULL as `None`.
impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Number(n) => f.write_str(n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Interpretation of a raw result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Vec<Cell>>),
    Empty,
    /// A literal that parsed to a single non-sequence value.
    Scalar(String),
    /// Output that is not a literal at all; shown verbatim.
    RawText(String),
}

/// Record of one question as shown to the user.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct PipelineRun {
    pub question: String,
    /// Generated SQL. Absent when translation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// Formatted answer. Absent when any stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// User-visible error message when a stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// SQLSTATE of a failed execution, when the server reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
