//! Handling of generated SQL text.
//!
//! - `extract`: turning a raw completion into one candidate statement
//! - `validator`: the single-statement, read-only guard applied before execution

pub mod extract;
pub mod validator;

pub use extract::{clean_completion, extract_sql};
pub use validator::{GuardOutcome, check_statement, strip_trailing_semicolon};
