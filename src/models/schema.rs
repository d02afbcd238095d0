//! Schema-related data models.
//!
//! The schema graph is built once per database selection: tables are the
//! nodes, foreign keys are directed edges from the owning table to the table
//! it references.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Canonical textual type as reported by the catalog (e.g. `character varying(40)`).
    pub declared_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// A foreign key reference from its owning table.
///
/// Only `referenced_table` takes part in the graph. The column pair is kept
/// for the textual schema summary handed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub referenced_table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_column: Option<String>,
}

impl ForeignKeyDescriptor {
    pub fn new(referenced_table: impl Into<String>) -> Self {
        Self {
            referenced_table: referenced_table.into(),
            column: None,
            referenced_column: None,
        }
    }

    pub fn with_columns(
        mut self,
        column: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.column = Some(column.into());
        self.referenced_column = Some(referenced_column.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// In declaration order.
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(
        mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        self.columns.push(ColumnDescriptor::new(name, declared_type));
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(fk);
        self
    }
}

/// A foreign key whose target is not among the introspected tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DanglingReference {
    pub from_table: String,
    pub referenced_table: String,
}

/// Tables of one database and the foreign-key edges between them.
///
/// Multiple edges between the same pair of tables and self-references are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub database: String,
    pub tables: Vec<TableDescriptor>,
}

impl SchemaGraph {
    pub fn new(database: impl Into<String>, tables: Vec<TableDescriptor>) -> Self {
        Self {
            database: database.into(),
            tables,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> HashSet<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of foreign-key edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.tables.iter().map(|t| t.foreign_keys.len()).sum()
    }

    /// Foreign keys pointing at tables outside the introspected set.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let known = self.table_names();
        self.tables
            .iter()
            .flat_map(|t| {
                t.foreign_keys
                    .iter()
                    .filter(|fk| !known.contains(fk.referenced_table.as_str()))
                    .map(|fk| DanglingReference {
                        from_table: t.name.clone(),
                        referenced_table: fk.referenced_table.clone(),
                    })
            })
            .collect()
    }
}
