//! Retrieval document construction.
//!
//! Merges an annotation set with an extracted schema into text + metadata
//! documents ready for a similarity-search index. The transformation is pure:
//! the same inputs always produce the same ordered output, following the
//! annotation set's insertion order.

use crate::models::{AnnotationSet, ForeignKeyRef, SchemaMap};
use serde::{Deserialize, Serialize};

/// A column enriched with its annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedColumn {
    pub name: String,
    pub data_type: String,
    pub description: String,
}

/// Structured metadata carried alongside the rendered text, so a consumer can
/// filter and facet without re-parsing the text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub table_name: String,
    pub table_description: String,
    pub columns: Vec<EnrichedColumn>,
    pub relationships: Vec<ForeignKeyRef>,
}

/// A text + metadata unit prepared for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Builds retrieval documents from annotations and a schema snapshot.
pub struct DocumentBuilder;

impl DocumentBuilder {
    /// Build one document per annotated table, in annotation insertion order.
    ///
    /// A table annotated but absent from the schema still produces a
    /// document, with empty column and relationship metadata; a column absent
    /// from the annotation renders with an empty description.
    pub fn build(annotations: &AnnotationSet, schema: &SchemaMap) -> Vec<RetrievalDocument> {
        annotations
            .iter()
            .map(|(table, annotation)| {
                let entry = schema.get(table);

                let mut content = format!(
                    "Table: {}\nDescription: {}\n",
                    table, annotation.table_description
                );
                content.push_str("Columns:\n");

                let mut columns = Vec::new();
                if let Some(entry) = entry {
                    for col in &entry.columns {
                        let description = annotation.column_description(&col.name);
                        content.push_str(&format!(
                            "  - {} ({}): {}\n",
                            col.name, col.data_type, description
                        ));
                        columns.push(EnrichedColumn {
                            name: col.name.clone(),
                            data_type: col.data_type.clone(),
                            description: description.to_string(),
                        });
                    }
                }

                let relationships = entry.map(|e| e.foreign_keys.clone()).unwrap_or_default();
                if let Some(entry) = entry {
                    let lines = entry.relationship_lines();
                    if !lines.is_empty() {
                        content.push_str("Relationships:\n");
                        for line in lines {
                            content.push_str(&format!("  - {}\n", line));
                        }
                    }
                }

                RetrievalDocument {
                    content,
                    metadata: DocumentMetadata {
                        table_name: table.to_string(),
                        table_description: annotation.table_description.clone(),
                        columns,
                        relationships,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, ColumnDescriptor, SchemaEntry};

    #[test]
    fn test_build_is_deterministic() {
        let mut annotations = AnnotationSet::new();
        annotations.insert(
            "orders",
            Annotation::describing("purchase records").with_column("id", "order id"),
        );
        let mut schema = SchemaMap::new();
        schema.insert(
            "orders".to_string(),
            SchemaEntry::new("orders").with_column(ColumnDescriptor::new("id", "INTEGER")),
        );

        let first = DocumentBuilder::build(&annotations, &schema);
        let second = DocumentBuilder::build(&annotations, &schema);
        assert_eq!(first, second);
    }

    #[test]
    fn test_relationships_section_omitted_without_foreign_keys() {
        let mut annotations = AnnotationSet::new();
        annotations.insert("customers", Annotation::describing("registered buyers"));
        let mut schema = SchemaMap::new();
        schema.insert(
            "customers".to_string(),
            SchemaEntry::new("customers").with_column(ColumnDescriptor::new("id", "INTEGER")),
        );

        let docs = DocumentBuilder::build(&annotations, &schema);
        assert!(!docs[0].content.contains("Relationships:"));
    }
}
