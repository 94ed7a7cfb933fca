//! Annotation data models.
//!
//! Annotations are human-authored descriptions attached to tables and
//! columns. They accumulate in an [`AnnotationSet`] keyed by table name with
//! last-write-wins semantics; iteration follows first-insertion order, which
//! the document builder preserves.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Operator-supplied descriptions for one table.
///
/// Incomplete annotations are fine: a missing table or column description
/// renders as an empty string downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub table_description: String,
    /// Column name -> description
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

impl Annotation {
    /// Create an annotation with a table description only.
    pub fn describing(table_description: impl Into<String>) -> Self {
        Self {
            table_description: table_description.into(),
            columns: HashMap::new(),
        }
    }

    /// Add a column description.
    pub fn with_column(
        mut self,
        column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.columns.insert(column.into(), description.into());
        self
    }

    /// Get a column description, defaulting to the empty string.
    pub fn column_description(&self, column: &str) -> &str {
        self.columns.get(column).map(String::as_str).unwrap_or("")
    }
}

/// In-memory set of annotations keyed by table name.
///
/// Re-inserting a table replaces its annotation but keeps its original
/// position; concurrent writers are not supported and must be serialized by
/// the caller.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    order: Vec<String>,
    entries: HashMap<String, Annotation>,
}

impl AnnotationSet {
    /// Create an empty annotation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the annotation for a table.
    pub fn insert(&mut self, table: impl Into<String>, annotation: Annotation) {
        let table = table.into();
        if !self.entries.contains_key(&table) {
            self.order.push(table.clone());
        }
        self.entries.insert(table, annotation);
    }

    /// Merge another set into this one, table by table, last write wins.
    pub fn merge(&mut self, other: AnnotationSet) {
        for table in other.order {
            if let Some(annotation) = other.entries.get(&table) {
                self.insert(table, annotation.clone());
            }
        }
    }

    /// Get the annotation for a table.
    pub fn get(&self, table: &str) -> Option<&Annotation> {
        self.entries.get(table)
    }

    /// Iterate annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.order
            .iter()
            .filter_map(|table| self.entries.get(table).map(|a| (table.as_str(), a)))
    }

    /// Annotated table names in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AnnotationSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (table, annotation) in self.iter() {
            map.serialize_entry(table, annotation)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnnotationSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AnnotationSetVisitor;

        impl<'de> Visitor<'de> for AnnotationSetVisitor {
            type Value = AnnotationSet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of table name to annotation")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                // MapAccess yields entries in document order, which becomes
                // the set's insertion order.
                let mut set = AnnotationSet::new();
                while let Some((table, annotation)) =
                    access.next_entry::<String, Annotation>()?
                {
                    set.insert(table, annotation);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(AnnotationSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut set = AnnotationSet::new();
        set.insert("orders", Annotation::describing("purchase records"));
        set.insert("customers", Annotation::describing("registered buyers"));
        set.insert("products", Annotation::describing("catalog"));

        let tables: Vec<&str> = set.tables().collect();
        assert_eq!(tables, vec!["orders", "customers", "products"]);
    }

    #[test]
    fn test_reinsert_replaces_but_keeps_position() {
        let mut set = AnnotationSet::new();
        set.insert("orders", Annotation::describing("first pass"));
        set.insert("customers", Annotation::describing("buyers"));
        set.insert("orders", Annotation::describing("second pass"));

        assert_eq!(set.len(), 2);
        let tables: Vec<&str> = set.tables().collect();
        assert_eq!(tables, vec!["orders", "customers"]);
        assert_eq!(set.get("orders").unwrap().table_description, "second pass");
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut base = AnnotationSet::new();
        base.insert("orders", Annotation::describing("old"));

        let mut update = AnnotationSet::new();
        update.insert("orders", Annotation::describing("new"));
        update.insert("customers", Annotation::describing("buyers"));

        base.merge(update);
        assert_eq!(base.get("orders").unwrap().table_description, "new");
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_column_description_defaults_to_empty() {
        let annotation = Annotation::describing("purchase records").with_column("id", "order id");
        assert_eq!(annotation.column_description("id"), "order id");
        assert_eq!(annotation.column_description("missing"), "");
    }

    #[test]
    fn test_json_roundtrip_preserves_document_order() {
        let raw = r#"{
            "orders": {"table_description": "purchase records", "columns": {"id": "order id"}},
            "customers": {"table_description": "registered buyers", "columns": {}}
        }"#;

        let set: AnnotationSet = serde_json::from_str(raw).unwrap();
        let tables: Vec<&str> = set.tables().collect();
        assert_eq!(tables, vec!["orders", "customers"]);

        let serialized = serde_json::to_string(&set).unwrap();
        assert!(serialized.find("orders").unwrap() < serialized.find("customers").unwrap());
    }

    #[test]
    fn test_json_missing_fields_default() {
        let raw = r#"{"orders": {}}"#;
        let set: AnnotationSet = serde_json::from_str(raw).unwrap();
        let annotation = set.get("orders").unwrap();
        assert_eq!(annotation.table_description, "");
        assert!(annotation.columns.is_empty());
    }
}
