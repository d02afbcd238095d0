//! Question tool.
//!
//! This module implements the `ask` MCP tool. Stage failures (translation,
//! execution) come back inside the result, next to the generated SQL, so the
//! caller can decide whether to rephrase. The session stays usable by other
//! tools while the question is answered.

use crate::error::AppResult;
use crate::models::PipelineRun;
use crate::session::{SharedSession, ask_shared};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

/// Input for the ask tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AskInput {
    /// Question about the selected database, in natural language
    pub question: String,
}

pub struct AskToolHandler {
    session: SharedSession,
}

impl AskToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub async fn ask(&self, input: AskInput) -> AppResult<PipelineRun> {
        info!(question_chars = input.question.len(), "Tool: ask called");
        ask_shared(&self.session, &input.question).await
    }
}
