//! Tests for the document builder: rendering, metadata, ordering, and the
//! tolerance rules for incomplete annotations.

use schema_annotator::config::ConnectionConfig;
use schema_annotator::db::SchemaExtractor;
use schema_annotator::documents::DocumentBuilder;
use schema_annotator::models::{
    Annotation, AnnotationSet, ColumnDescriptor, ForeignKeyRef, SchemaEntry, SchemaMap,
};

fn fixture_schema() -> SchemaMap {
    let mut schema = SchemaMap::new();
    schema.insert(
        "customers".to_string(),
        SchemaEntry::new("customers")
            .with_column(ColumnDescriptor::new("id", "INTEGER"))
            .with_primary_key(vec!["id".to_string()]),
    );
    schema.insert(
        "orders".to_string(),
        SchemaEntry::new("orders")
            .with_column(ColumnDescriptor::new("id", "INTEGER"))
            .with_column(ColumnDescriptor::new("customer_id", "INTEGER"))
            .with_primary_key(vec!["id".to_string()])
            .with_foreign_key(ForeignKeyRef::new("customer_id", "customers", "id")),
    );
    schema
}

#[test]
fn test_single_annotated_table_renders_text_and_metadata() {
    let mut annotations = AnnotationSet::new();
    annotations.insert(
        "orders",
        Annotation::describing("purchase records").with_column("id", "order id"),
    );

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    assert_eq!(documents.len(), 1);

    let doc = &documents[0];
    assert!(doc.content.contains("Table: orders"));
    assert!(doc.content.contains("purchase records"));
    assert!(doc.content.contains("id (INTEGER): order id"));
    assert!(
        doc.content
            .contains("Relationships:\n  - orders.customer_id -> customers.id")
    );

    assert_eq!(doc.metadata.table_name, "orders");
    assert_eq!(doc.metadata.table_description, "purchase records");
    assert_eq!(doc.metadata.columns.len(), 2);
    assert_eq!(doc.metadata.relationships.len(), 1);
    assert_eq!(doc.metadata.relationships[0].references_table, "customers");
    assert_eq!(
        doc.metadata.relationships[0].references_columns,
        vec!["id".to_string()]
    );
}

#[test]
fn test_unannotated_column_renders_empty_description() {
    let mut annotations = AnnotationSet::new();
    annotations.insert(
        "orders",
        Annotation::describing("purchase records").with_column("id", "order id"),
    );

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    let doc = &documents[0];

    // customer_id is in the schema but not in the annotation's column map
    assert!(doc.content.contains("customer_id (INTEGER): \n"));
    let customer_id = doc
        .metadata
        .columns
        .iter()
        .find(|c| c.name == "customer_id")
        .unwrap();
    assert_eq!(customer_id.description, "");
}

#[test]
fn test_table_missing_from_schema_yields_empty_document() {
    let mut annotations = AnnotationSet::new();
    annotations.insert("ghost", Annotation::describing("no longer extracted"));

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    assert_eq!(documents.len(), 1);

    let doc = &documents[0];
    assert!(doc.content.contains("Table: ghost"));
    assert!(doc.content.contains("no longer extracted"));
    assert!(doc.metadata.columns.is_empty());
    assert!(doc.metadata.relationships.is_empty());
    assert!(!doc.content.contains("Relationships:"));
}

#[test]
fn test_documents_follow_annotation_insertion_order() {
    let mut annotations = AnnotationSet::new();
    annotations.insert("orders", Annotation::describing("purchase records"));
    annotations.insert("customers", Annotation::describing("registered buyers"));

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    let tables: Vec<&str> = documents
        .iter()
        .map(|d| d.metadata.table_name.as_str())
        .collect();
    assert_eq!(tables, vec!["orders", "customers"]);
}

#[test]
fn test_reannotating_a_table_uses_latest_description() {
    let mut annotations = AnnotationSet::new();
    annotations.insert("orders", Annotation::describing("first draft"));
    annotations.insert("orders", Annotation::describing("purchase records"));

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].metadata.table_description, "purchase records");
}

#[test]
fn test_documents_serialize_for_index_upload() {
    let mut annotations = AnnotationSet::new();
    annotations.insert(
        "orders",
        Annotation::describing("purchase records").with_column("id", "order id"),
    );

    let documents = DocumentBuilder::build(&annotations, &fixture_schema());
    let json = serde_json::to_string(&documents).unwrap();
    assert!(json.contains("\"table_name\":\"orders\""));
    assert!(json.contains("\"references_table\":\"customers\""));
}

#[tokio::test]
async fn test_documents_from_live_sqlite_schema() {
    let extractor = SchemaExtractor::new(ConnectionConfig::sqlite(":memory:", true)).unwrap();
    for statement in [
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers(id))",
    ] {
        extractor.execute_query(statement).await.unwrap();
    }
    let schema = extractor.extract_schema().await.unwrap();

    let mut annotations = AnnotationSet::new();
    annotations.insert(
        "orders",
        Annotation::describing("purchase records").with_column("customer_id", "buyer reference"),
    );

    let documents = DocumentBuilder::build(&annotations, &schema);
    assert_eq!(documents.len(), 1);
    assert!(
        documents[0]
            .content
            .contains("customer_id (INTEGER): buyer reference")
    );
    assert!(
        documents[0]
            .content
            .contains("orders.customer_id -> customers.id")
    );

    extractor.dispose().await;
}
