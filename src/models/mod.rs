//! Data models for the schema annotator.
//!
//! This module re-exports all model types used throughout the application.

pub mod annotation;
pub mod schema;

// Re-export commonly used types
pub use annotation::{Annotation, AnnotationSet};
pub use schema::{
    ColumnDescriptor, ForeignKeyRef, SchemaEntry, SchemaMap, SchemaSummary, summarize,
};
