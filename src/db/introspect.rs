//! Schema introspection.
//!
//! This module queries the metadata catalogs of PostgreSQL, MySQL, and SQLite
//! and normalizes the results into [`SchemaEntry`] values. SQL queries live
//! in the `queries` submodule; engine-specific implementations follow in
//! their own submodules, each providing the same interface.

use crate::db::pool::DbPool;
use crate::error::{AnnotatorError, AnnotatorResult};
use crate::models::{ColumnDescriptor, ForeignKeyRef, SchemaEntry, SchemaMap};
use tracing::debug;

/// Default namespace used for PostgreSQL catalog queries.
const POSTGRES_SCHEMA: &str = "public";

/// List all base tables visible to the connection.
pub async fn list_tables(pool: &DbPool) -> AnnotatorResult<Vec<String>> {
    let tables = match pool {
        DbPool::Postgres(p) => postgres::list_tables(p, POSTGRES_SCHEMA).await?,
        DbPool::MySql(p) => mysql::list_tables(p).await?,
        DbPool::Sqlite(p) => sqlite::list_tables(p).await?,
    };
    debug!(count = tables.len(), engine = %pool.engine(), "Listed tables");
    Ok(tables)
}

/// List the columns of a single table, in ordinal position order.
pub async fn list_columns(pool: &DbPool, table: &str) -> AnnotatorResult<Vec<ColumnDescriptor>> {
    let columns = match pool {
        DbPool::Postgres(p) => postgres::fetch_columns(p, table, POSTGRES_SCHEMA).await?,
        DbPool::MySql(p) => mysql::fetch_columns(p, table).await?,
        DbPool::Sqlite(p) => sqlite::fetch_columns(p, table).await?,
    };
    Ok(columns.into_iter().map(|(col, _)| col).collect())
}

/// Gather the full entry for a table: columns, primary key, foreign keys.
pub async fn table_entry(pool: &DbPool, table: &str) -> AnnotatorResult<SchemaEntry> {
    let (columns, foreign_keys) = match pool {
        DbPool::Postgres(p) => (
            postgres::fetch_columns(p, table, POSTGRES_SCHEMA).await?,
            postgres::fetch_foreign_keys(p, table, POSTGRES_SCHEMA).await?,
        ),
        DbPool::MySql(p) => (
            mysql::fetch_columns(p, table).await?,
            mysql::fetch_foreign_keys(p, table).await?,
        ),
        DbPool::Sqlite(p) => (
            sqlite::fetch_columns(p, table).await?,
            sqlite::fetch_foreign_keys(p, table).await?,
        ),
    };

    if columns.is_empty() {
        return Err(AnnotatorError::introspection(
            format!("No columns reported for table '{}'", table),
            table.to_string(),
        ));
    }

    let primary_key = columns
        .iter()
        .filter(|(_, is_pk)| *is_pk)
        .map(|(col, _)| col.name.clone())
        .collect();

    Ok(SchemaEntry {
        table: table.to_string(),
        columns: columns.into_iter().map(|(col, _)| col).collect(),
        primary_key,
        foreign_keys,
    })
}

/// Extract the whole schema as one consistent snapshot.
///
/// Any failure mid-call fails the extraction; a half-built map is never
/// returned, since downstream annotation keys off fully-formed table names.
pub async fn extract_schema(pool: &DbPool) -> AnnotatorResult<SchemaMap> {
    let tables = list_tables(pool)
        .await
        .map_err(|e| as_introspection(e, "tables"))?;

    let mut schema = SchemaMap::new();
    for table in tables {
        let entry = table_entry(pool, &table)
            .await
            .map_err(|e| as_introspection(e, &table))?;
        schema.insert(table, entry);
    }

    debug!(tables = schema.len(), "Extracted schema snapshot");
    Ok(schema)
}

fn as_introspection(err: AnnotatorError, object: &str) -> AnnotatorError {
    match err {
        e @ AnnotatorError::Introspection { .. } => e,
        other => AnnotatorError::introspection(other.to_string(), object),
    }
}

/// Fold (constraint name, local column, referenced table, referenced column)
/// rows, ordered by constraint and position, into composite foreign keys.
fn group_foreign_keys(rows: Vec<(String, String, String, String)>) -> Vec<ForeignKeyRef> {
    let mut grouped: Vec<(String, ForeignKeyRef)> = Vec::new();
    for (constraint, column, ref_table, ref_column) in rows {
        match grouped.last_mut() {
            Some((name, fk)) if *name == constraint && fk.references_table == ref_table => {
                fk.columns.push(column);
                fk.references_columns.push(ref_column);
            }
            _ => grouped.push((
                constraint,
                ForeignKeyRef {
                    columns: vec![column],
                    references_table: ref_table,
                    references_columns: vec![ref_column],
                },
            )),
        }
    }
    grouped.into_iter().map(|(_, fk)| fk).collect()
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = $1
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name,
            format_type(a.atttypid, a.atttypmod) as column_type,
            CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END as is_primary_key
        FROM information_schema.columns c
        JOIN pg_class t ON t.relname = c.table_name
        JOIN pg_namespace n ON n.oid = t.relnamespace AND n.nspname = c.table_schema
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        LEFT JOIN (
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_name = $1
            AND tc.table_schema = $2
            AND tc.constraint_type = 'PRIMARY KEY'
        ) pk ON c.column_name = pk.column_name
        WHERE c.table_name = $1 AND c.table_schema = $2
        ORDER BY c.ordinal_position
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            tc.constraint_name,
            kcu.column_name,
            ccu.table_name AS foreign_table_name,
            ccu.column_name AS foreign_column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
            ON ccu.constraint_name = tc.constraint_name
            AND ccu.table_schema = tc.table_schema
        WHERE tc.table_name = $1
        AND tc.table_schema = $2
        AND tc.constraint_type = 'FOREIGN KEY'
        ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
            CONVERT(COLUMN_KEY USING utf8) AS COLUMN_KEY
        FROM information_schema.columns
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        ORDER BY ORDINAL_POSITION
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(CONSTRAINT_NAME USING utf8) AS CONSTRAINT_NAME,
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(REFERENCED_TABLE_NAME USING utf8) AS REFERENCED_TABLE_NAME,
            CONVERT(REFERENCED_COLUMN_NAME USING utf8) AS REFERENCED_COLUMN_NAME
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_NAME = ?
        AND TABLE_SCHEMA = DATABASE()
        AND REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Engine-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn list_tables(pool: &PgPool, schema: &str) -> AnnotatorResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(schema)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("table_name")).collect())
    }

    pub async fn fetch_columns(
        pool: &PgPool,
        table: &str,
        schema: &str,
    ) -> AnnotatorResult<Vec<(ColumnDescriptor, bool)>> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("column_name");
                let column_type: String = row.get("column_type");
                let is_pk: bool = row.get("is_primary_key");
                (ColumnDescriptor::new(name, column_type), is_pk)
            })
            .collect())
    }

    pub async fn fetch_foreign_keys(
        pool: &PgPool,
        table: &str,
        schema: &str,
    ) -> AnnotatorResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_FOREIGN_KEYS)
            .bind(table)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        let raw = rows
            .iter()
            .map(|row| {
                (
                    row.get("constraint_name"),
                    row.get("column_name"),
                    row.get("foreign_table_name"),
                    row.get("foreign_column_name"),
                )
            })
            .collect();
        Ok(group_foreign_keys(raw))
    }
}

mod mysql {
    use super::*;
    use sqlx::{MySqlPool, Row};

    /// MySQL may return VARBINARY instead of VARCHAR depending on charset
    /// configuration.
    fn get_string(row: &sqlx::mysql::MySqlRow, column: &str) -> String {
        row.try_get::<String, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(column)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
            .unwrap_or_default()
    }

    pub async fn list_tables(pool: &MySqlPool) -> AnnotatorResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| get_string(row, "TABLE_NAME"))
            .filter(|name| !name.is_empty())
            .collect())
    }

    pub async fn fetch_columns(
        pool: &MySqlPool,
        table: &str,
    ) -> AnnotatorResult<Vec<(ColumnDescriptor, bool)>> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name = get_string(row, "COLUMN_NAME");
                let column_type = get_string(row, "COLUMN_TYPE");
                let is_pk = get_string(row, "COLUMN_KEY") == "PRI";
                (ColumnDescriptor::new(name, column_type), is_pk)
            })
            .collect())
    }

    pub async fn fetch_foreign_keys(
        pool: &MySqlPool,
        table: &str,
    ) -> AnnotatorResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_FOREIGN_KEYS)
            .bind(table)
            .fetch_all(pool)
            .await?;

        let raw = rows
            .iter()
            .map(|row| {
                (
                    get_string(row, "CONSTRAINT_NAME"),
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "REFERENCED_TABLE_NAME"),
                    get_string(row, "REFERENCED_COLUMN_NAME"),
                )
            })
            .collect();
        Ok(group_foreign_keys(raw))
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_tables(pool: &SqlitePool) -> AnnotatorResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    pub async fn fetch_columns(
        pool: &SqlitePool,
        table: &str,
    ) -> AnnotatorResult<Vec<(ColumnDescriptor, bool)>> {
        let pragma_query = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
        let rows = sqlx::query(&pragma_query).fetch_all(pool).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("name");
                let data_type: String = row.get("type");
                let pk: i32 = row.get("pk");
                (ColumnDescriptor::new(name, data_type), pk > 0)
            })
            .collect())
    }

    pub async fn fetch_foreign_keys(
        pool: &SqlitePool,
        table: &str,
    ) -> AnnotatorResult<Vec<ForeignKeyRef>> {
        let fk_query = format!("PRAGMA foreign_key_list('{}')", table.replace('\'', "''"));
        let rows = sqlx::query(&fk_query).fetch_all(pool).await?;

        // PRAGMA rows are ordered by constraint id and sequence; the id
        // stands in for a constraint name when grouping composite keys.
        let raw = rows
            .iter()
            .map(|row| {
                let id: i32 = row.get("id");
                let column: String = row.get("from");
                let ref_table: String = row.get("table");
                // "to" is NULL when the constraint references an implicit
                // primary key
                let ref_column: String = row
                    .try_get::<Option<String>, _>("to")
                    .ok()
                    .flatten()
                    .unwrap_or_default();
                (id.to_string(), column, ref_table, ref_column)
            })
            .collect();
        Ok(group_foreign_keys(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_single_column_keys() {
        let rows = vec![
            (
                "fk_customer".to_string(),
                "customer_id".to_string(),
                "customers".to_string(),
                "id".to_string(),
            ),
            (
                "fk_product".to_string(),
                "product_id".to_string(),
                "products".to_string(),
                "id".to_string(),
            ),
        ];
        let fks = group_foreign_keys(rows);
        assert_eq!(fks.len(), 2);
        assert_eq!(fks[0].columns, vec!["customer_id"]);
        assert_eq!(fks[0].references_table, "customers");
        assert_eq!(fks[1].references_table, "products");
    }

    #[test]
    fn test_group_composite_key() {
        let rows = vec![
            (
                "fk_line".to_string(),
                "order_id".to_string(),
                "order_lines".to_string(),
                "order_id".to_string(),
            ),
            (
                "fk_line".to_string(),
                "line_no".to_string(),
                "order_lines".to_string(),
                "no".to_string(),
            ),
        ];
        let fks = group_foreign_keys(rows);
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].columns, vec!["order_id", "line_no"]);
        assert_eq!(fks[0].references_columns, vec!["order_id", "no"]);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_foreign_keys(Vec::new()).is_empty());
    }
}
