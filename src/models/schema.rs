//! Schema-related data models.
//!
//! This module defines the normalized shape of an extracted schema: columns,
//! foreign keys, per-table entries, and the schema map produced atomically by
//! each extraction call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column as reported by introspection: name plus the rendered type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Rendered type (e.g., `varchar(30)`, `bigint unsigned`)
    pub data_type: String,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A foreign-key constraint. Multi-column constraints keep their local and
/// referenced columns aligned by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub columns: Vec<String>,
    pub references_table: String,
    pub references_columns: Vec<String>,
}

impl ForeignKeyRef {
    /// Create a single-column foreign key.
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            columns: vec![column.into()],
            references_table: references_table.into(),
            references_columns: vec![references_column.into()],
        }
    }
}

/// The extracted shape of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl SchemaEntry {
    /// Create an empty entry for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Add a foreign key.
    pub fn with_foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Render each foreign key as one `table.col -> ref_table.ref_col` line.
    pub fn relationship_lines(&self) -> Vec<String> {
        self.foreign_keys
            .iter()
            .flat_map(|fk| {
                fk.columns
                    .iter()
                    .zip(&fk.references_columns)
                    .map(|(local, remote)| {
                        format!(
                            "{}.{} -> {}.{}",
                            self.table, local, fk.references_table, remote
                        )
                    })
            })
            .collect()
    }
}

/// Mapping from table name to its extracted entry.
///
/// Produced atomically per extraction call and never updated incrementally;
/// callers re-extract to refresh. `BTreeMap` keeps the map structurally
/// comparable across extractions.
pub type SchemaMap = BTreeMap<String, SchemaEntry>;

/// A condensed, display-oriented view of a table: column name/type pairs plus
/// rendered relationship lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub columns: Vec<ColumnDescriptor>,
    pub relationships: Vec<String>,
}

/// Summarize a schema map for display or annotation UIs.
pub fn summarize(schema: &SchemaMap) -> BTreeMap<String, SchemaSummary> {
    schema
        .iter()
        .map(|(table, entry)| {
            (
                table.clone(),
                SchemaSummary {
                    columns: entry.columns.clone(),
                    relationships: entry.relationship_lines(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_entry() -> SchemaEntry {
        SchemaEntry::new("orders")
            .with_column(ColumnDescriptor::new("id", "INTEGER"))
            .with_column(ColumnDescriptor::new("customer_id", "INTEGER"))
            .with_primary_key(vec!["id".to_string()])
            .with_foreign_key(ForeignKeyRef::new("customer_id", "customers", "id"))
    }

    #[test]
    fn test_relationship_lines() {
        let entry = orders_entry();
        assert_eq!(
            entry.relationship_lines(),
            vec!["orders.customer_id -> customers.id".to_string()]
        );
    }

    #[test]
    fn test_relationship_lines_composite_key() {
        let entry = SchemaEntry::new("order_items").with_foreign_key(ForeignKeyRef {
            columns: vec!["order_id".to_string(), "line_no".to_string()],
            references_table: "order_lines".to_string(),
            references_columns: vec!["order_id".to_string(), "no".to_string()],
        });
        assert_eq!(
            entry.relationship_lines(),
            vec![
                "order_items.order_id -> order_lines.order_id".to_string(),
                "order_items.line_no -> order_lines.no".to_string(),
            ]
        );
    }

    #[test]
    fn test_summarize() {
        let mut schema = SchemaMap::new();
        schema.insert("orders".to_string(), orders_entry());
        schema.insert(
            "customers".to_string(),
            SchemaEntry::new("customers")
                .with_column(ColumnDescriptor::new("id", "INTEGER"))
                .with_primary_key(vec!["id".to_string()]),
        );

        let summary = summarize(&schema);
        assert_eq!(summary.len(), 2);
        assert_eq!(
            summary["orders"].relationships,
            vec!["orders.customer_id -> customers.id".to_string()]
        );
        assert!(summary["customers"].relationships.is_empty());
        assert_eq!(summary["customers"].columns.len(), 1);
    }

    #[test]
    fn test_schema_entry_structural_equality() {
        assert_eq!(orders_entry(), orders_entry());
    }
}
