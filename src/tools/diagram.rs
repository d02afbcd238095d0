//! Schema diagram tool.

use crate::diagram::SchemaDiagram;
use crate::error::{AppError, AppResult};
use crate::session::SharedSession;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    /// Graphviz DOT source
    #[default]
    Dot,
    /// Node and edge lists
    Json,
}

/// Input for the schema_diagram tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SchemaDiagramInput {
    /// Output format: "dot" (default) or "json"
    #[serde(default)]
    pub format: DiagramFormat,
}

/// Output for the schema_diagram tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SchemaDiagramOutput {
    pub database: String,
    pub format: DiagramFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram: Option<SchemaDiagram>,
}

pub struct DiagramToolHandler {
    session: SharedSession,
}

impl DiagramToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// Diagram of the selected database, as rendered at selection time.
    pub async fn schema_diagram(
        &self,
        input: SchemaDiagramInput,
    ) -> AppResult<SchemaDiagramOutput> {
        info!(format = ?input.format, "Tool: schema_diagram called");
        let session = self.session.lock().await;
        if session.server().is_none() {
            return Err(AppError::NoServer);
        }
        let selected = session.selected().ok_or(AppError::NoDatabaseSelected)?;

        let (dot, diagram) = match input.format {
            DiagramFormat::Dot => (Some(selected.diagram.to_dot()), None),
            DiagramFormat::Json => (None, Some(selected.diagram.clone())),
        };
        Ok(SchemaDiagramOutput {
            database: selected.name.clone(),
            format: input.format,
            dot,
            diagram,
        })
    }
}
