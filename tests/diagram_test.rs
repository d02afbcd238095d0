//! Integration tests for the schema diagram.

use talk_to_sql::diagram::{DiagramEdge, SchemaDiagram};
use talk_to_sql::models::{ForeignKeyDescriptor, SchemaGraph, TableDescriptor};

fn shop() -> SchemaGraph {
    SchemaGraph::new(
        "shop",
        vec![
            TableDescriptor::new("users")
                .with_column("id", "integer")
                .with_column("email", "character varying(255)"),
            TableDescriptor::new("orders")
                .with_column("id", "integer")
                .with_column("user_id", "integer")
                .with_column("approved_by", "integer")
                .with_foreign_key(ForeignKeyDescriptor::new("users").with_columns("user_id", "id"))
                .with_foreign_key(
                    ForeignKeyDescriptor::new("users").with_columns("approved_by", "id"),
                ),
            TableDescriptor::new("categories")
                .with_column("id", "integer")
                .with_column("parent_id", "integer")
                .with_foreign_key(ForeignKeyDescriptor::new("categories")),
        ],
    )
}

#[test]
fn test_empty_schema_gives_empty_diagram() {
    let diagram = SchemaDiagram::from_graph(&SchemaGraph::new("empty", vec![]));
    assert!(diagram.nodes.is_empty());
    assert!(diagram.edges.is_empty());
    assert!(diagram.is_empty());

    let dot = diagram.to_dot();
    assert!(!dot.contains("->"));
    assert!(!dot.contains("label="));
}

#[test]
fn test_one_edge_per_foreign_key_owner_to_referenced() {
    let graph = shop();
    let diagram = SchemaDiagram::from_graph(&graph);

    assert_eq!(diagram.nodes.len(), 3);
    assert_eq!(diagram.edges.len(), graph.edge_count());
    assert_eq!(
        diagram.edges,
        vec![
            DiagramEdge {
                from: "orders".to_string(),
                to: "users".to_string()
            },
            DiagramEdge {
                from: "orders".to_string(),
                to: "users".to_string()
            },
            DiagramEdge {
                from: "categories".to_string(),
                to: "categories".to_string()
            },
        ]
    );

    let dot = diagram.to_dot();
    assert_eq!(dot.matches("\"orders\" -> \"users\";").count(), 2);
    assert_eq!(dot.matches("\"categories\" -> \"categories\";").count(), 1);
}

#[test]
fn test_columns_listed_in_declaration_order() {
    let diagram = SchemaDiagram::from_graph(&shop());
    let orders = diagram.nodes.iter().find(|n| n.id == "orders").unwrap();
    assert_eq!(
        orders.columns,
        vec!["id (integer)", "user_id (integer)", "approved_by (integer)"]
    );
    assert!(diagram.to_dot().contains(
        "\"users\" [label=\"{ users | id (integer)\\l email (character varying(255))\\l }\"];"
    ));
}

#[test]
fn test_table_without_foreign_keys_has_no_outgoing_edges() {
    let diagram = SchemaDiagram::from_graph(&shop());
    assert!(diagram.edges.iter().all(|e| e.from != "users"));
}

#[test]
fn test_external_reference_gets_placeholder() {
    let graph = SchemaGraph::new(
        "app",
        vec![
            TableDescriptor::new("audit")
                .with_column("event_id", "bigint")
                .with_foreign_key(ForeignKeyDescriptor::new("archive.events")),
        ],
    );
    let diagram = SchemaDiagram::from_graph(&graph);
    assert_eq!(diagram.edges.len(), 1);
    let placeholder = diagram
        .nodes
        .iter()
        .find(|n| n.id == "archive.events")
        .expect("placeholder node");
    assert!(placeholder.external);
    assert!(placeholder.columns.is_empty());
    assert!(diagram.to_dot().contains("\"audit\" -> \"archive.events\";"));
}

#[test]
fn test_json_form_omits_external_flag_for_tables() {
    let diagram = SchemaDiagram::from_graph(&shop());
    let json = serde_json::to_value(&diagram).unwrap();
    assert_eq!(json["nodes"][0]["id"], "users");
    assert!(json["nodes"][0].get("external").is_none());
    assert_eq!(json["edges"][0]["from"], "orders");
}
