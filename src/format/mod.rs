//! Result rendering.
//!
//! - `literal`: the row-tuple literal the executor produces, and its parser
//! - `answer`: the human-readable answer built from it

pub mod answer;
pub mod literal;

pub use answer::{NO_RESULTS_MESSAGE, ResultFormatter};
