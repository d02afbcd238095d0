//! Result formatter: raw executor output to the answer shown to the user.

use crate::format::literal;
use crate::models::{Cell, QueryOutcome, RawResult};

/// Shown when the query ran and returned no rows.
pub const NO_RESULTS_MESSAGE: &str = "The query returned no results.";

/// Separator between fields when every column is rendered.
const COLUMN_SEPARATOR: &str = " | ";

/// Turns executor output into answer text.
///
/// By default only the first field of each row is shown, which fits the
/// usual single-column answer query. With `all_columns` every field is shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter {
    all_columns: bool,
}

impl ResultFormatter {
    pub fn new(all_columns: bool) -> Self {
        Self { all_columns }
    }

    /// Interpret raw output without rendering it.
    pub fn interpret(&self, raw: &RawResult) -> QueryOutcome {
        literal::parse(raw.as_str())
    }

    /// Render an interpreted outcome.
    pub fn render(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Rows(rows) => rows
                .iter()
                .map(|row| format!("- {}", self.render_row(row)))
                .collect::<Vec<_>>()
                .join("\n"),
            QueryOutcome::Empty => NO_RESULTS_MESSAGE.to_string(),
            QueryOutcome::Scalar(text) | QueryOutcome::RawText(text) => text.clone(),
        }
    }

    pub fn format(&self, raw: &RawResult) -> String {
        self.render(&self.interpret(raw))
    }

    fn render_row(&self, row: &[Cell]) -> String {
        if self.all_columns {
            row.iter()
                .map(Cell::to_string)
                .collect::<Vec<_>>()
                .join(COLUMN_SEPARATOR)
        } else {
            row.first().map(Cell::to_string).unwrap_or_default()
        }
    }
}
