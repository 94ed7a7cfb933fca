//! Statement execution.
//!
//! Each call acquires its own connection, runs a single statement, fully
//! materializes the result set as JSON maps, and releases the connection
//! before returning. No connection is held across calls.

use crate::db::pool::DbPool;
use crate::db::rows::RowToJson;
use crate::error::AnnotatorResult;
use serde_json::Value as JsonValue;
use tracing::debug;

/// One result row, column name to decoded value.
pub type ResultRow = serde_json::Map<String, JsonValue>;

/// Execute a statement on a scoped connection and collect all rows.
pub async fn fetch_rows(pool: &DbPool, sql: &str) -> AnnotatorResult<Vec<ResultRow>> {
    debug!(sql = %sql, engine = %pool.engine(), "Executing statement");

    let rows = match pool {
        DbPool::Postgres(p) => {
            let mut conn = p.acquire().await?;
            let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
            rows.iter().map(|row| row.to_json_map()).collect()
        }
        DbPool::MySql(p) => {
            let mut conn = p.acquire().await?;
            let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
            rows.iter().map(|row| row.to_json_map()).collect()
        }
        DbPool::Sqlite(p) => {
            let mut conn = p.acquire().await?;
            let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
            rows.iter().map(|row| row.to_json_map()).collect()
        }
    };

    Ok(rows)
}
