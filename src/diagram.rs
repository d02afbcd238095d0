//! Schema diagram.
//!
//! Turns a [`SchemaGraph`] into a node/edge description and Graphviz DOT text.
//! Each table is one record node listing `column (type)` lines; each foreign
//! key is one edge from the owning table to the referenced table.
//!
//! A foreign key whose target was not introspected (another schema, or a table
//! created after the scan) points at a dashed placeholder node labelled
//! `<name> (external)`, so no edge is ever dropped.

use crate::models::SchemaGraph;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DiagramNode {
    /// Table name; also the DOT node id.
    pub id: String,
    /// `column (type)` lines in declaration order.
    pub columns: Vec<String>,
    /// True for nodes synthesized for tables outside the graph.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SchemaDiagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl SchemaDiagram {
    pub fn from_graph(graph: &SchemaGraph) -> Self {
        let known = graph.table_names();
        let mut nodes: Vec<DiagramNode> = graph
            .tables
            .iter()
            .map(|table| DiagramNode {
                id: table.name.clone(),
                columns: table
                    .columns
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.declared_type))
                    .collect(),
                external: false,
            })
            .collect();

        let mut edges = Vec::with_capacity(graph.edge_count());
        let mut placeholders: HashSet<&str> = HashSet::new();
        for table in &graph.tables {
            for fk in &table.foreign_keys {
                let target = fk.referenced_table.as_str();
                if !known.contains(target) && placeholders.insert(target) {
                    nodes.push(DiagramNode {
                        id: target.to_string(),
                        columns: Vec::new(),
                        external: true,
                    });
                }
                edges.push(DiagramEdge {
                    from: table.name.clone(),
                    to: target.to_string(),
                });
            }
        }

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Graphviz DOT: left-to-right ranks, orthogonal edges, rounded record nodes.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph database_schema {\n");
        out.push_str("    graph [rankdir=LR, splines=ortho];\n");
        out.push_str("    node [shape=record, style=rounded, fontname=\"Arial\"];\n");
        out.push_str("    edge [arrowsize=0.7];\n");

        for node in &self.nodes {
            if node.external {
                let _ = writeln!(
                    out,
                    "    {} [label=\"{}\", style=\"rounded,dashed\"];",
                    quote_id(&node.id),
                    escape_record(&format!("{} (external)", node.id))
                );
            } else {
                let _ = writeln!(
                    out,
                    "    {} [label=\"{}\"];",
                    quote_id(&node.id),
                    record_label(node)
                );
            }
        }
        for edge in &self.edges {
            let _ = writeln!(out, "    {} -> {};", quote_id(&edge.from), quote_id(&edge.to));
        }

        out.push('}');
        out.push('\n');
        out
    }
}

/// `{ table | col (type)\l col (type)\l }`: header cell plus left-justified column lines.
fn record_label(node: &DiagramNode) -> String {
    let mut label = format!("{{ {} |", escape_record(&node.id));
    for column in &node.columns {
        let _ = write!(label, " {}\\l", escape_record(column));
    }
    label.push_str(" }");
    label
}

fn quote_id(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape text for use inside a quoted record label.
fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '"' | '{' | '}' | '|' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForeignKeyDescriptor, TableDescriptor};

    #[test]
    fn test_record_label() {
        let node = DiagramNode {
            id: "users".to_string(),
            columns: vec!["id (integer)".to_string(), "name (text)".to_string()],
            external: false,
        };
        assert_eq!(record_label(&node), "{ users | id (integer)\\l name (text)\\l }");
    }

    #[test]
    fn test_escape_record_metacharacters() {
        assert_eq!(escape_record("a|b"), "a\\|b");
        assert_eq!(escape_record("{x}<y>"), "\\{x\\}\\<y\\>");
        assert_eq!(escape_record("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_placeholder_is_created_once() {
        let graph = SchemaGraph::new(
            "app",
            vec![
                TableDescriptor::new("a").with_foreign_key(ForeignKeyDescriptor::new("ext.t")),
                TableDescriptor::new("b").with_foreign_key(ForeignKeyDescriptor::new("ext.t")),
            ],
        );
        let diagram = SchemaDiagram::from_graph(&graph);
        assert_eq!(diagram.nodes.len(), 3);
        assert_eq!(diagram.edges.len(), 2);
        assert!(diagram.nodes.iter().filter(|n| n.external).count() == 1);
        assert!(diagram.to_dot().contains("label=\"ext.t (external)\", style=\"rounded,dashed\""));
    }

    #[test]
    fn test_zero_column_table_renders() {
        let graph = SchemaGraph::new("app", vec![TableDescriptor::new("empty")]);
        let dot = SchemaDiagram::from_graph(&graph).to_dot();
        assert!(dot.contains("\"empty\" [label=\"{ empty | }\"];"));
    }

    #[test]
    fn test_dot_attributes() {
        let dot = SchemaDiagram::default().to_dot();
        assert!(dot.starts_with("digraph database_schema {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("splines=ortho"));
        assert!(dot.contains("shape=record, style=rounded"));
        assert!(dot.contains("arrowsize=0.7"));
    }
}
