//! Connection pool management.
//!
//! This module builds database-specific pools (PgPool, MySqlPool, SqlitePool)
//! from an immutable [`ConnectionConfig`]. Pools are created lazily; the
//! first statement opens the physical connection, and `ping` provides the
//! explicit acquire-test-release round trip.

use crate::config::{ConnectionConfig, EngineKind};
use crate::error::AnnotatorResult;
use sqlx::{
    Connection, MySqlPool, PgPool, SqlitePool, mysql::MySqlPoolOptions, postgres::PgPoolOptions,
    sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// SQLite pools hold a single connection so an in-memory database survives
/// scoped acquire/release cycles.
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Build a lazy pool for the given configuration. The connection target
    /// is derived strictly from the configuration's fields.
    pub fn connect(config: &ConnectionConfig) -> AnnotatorResult<Self> {
        let url = config.connection_url();
        debug!(
            engine = %config.engine,
            target = %config.masked_url(),
            "Creating connection pool"
        );

        let pool = match config.engine {
            EngineKind::Postgres => DbPool::Postgres(
                PgPoolOptions::new()
                    .max_connections(DEFAULT_MAX_CONNECTIONS)
                    .connect_lazy(&url)?,
            ),
            EngineKind::MySql => DbPool::MySql(
                MySqlPoolOptions::new()
                    .max_connections(DEFAULT_MAX_CONNECTIONS)
                    .connect_lazy(&url)?,
            ),
            EngineKind::Sqlite => {
                let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
                DbPool::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(DEFAULT_MAX_CONNECTIONS_SQLITE)
                        .connect_lazy_with(options),
                )
            }
        };

        Ok(pool)
    }

    /// Get the engine kind for this pool.
    pub fn engine(&self) -> EngineKind {
        match self {
            DbPool::Postgres(_) => EngineKind::Postgres,
            DbPool::MySql(_) => EngineKind::MySql,
            DbPool::Sqlite(_) => EngineKind::Sqlite,
        }
    }

    /// Acquire a connection, test it with a round trip, and release it before
    /// returning.
    pub async fn ping(&self) -> AnnotatorResult<()> {
        match self {
            DbPool::Postgres(pool) => {
                let mut conn = pool.acquire().await?;
                conn.ping().await?;
            }
            DbPool::MySql(pool) => {
                let mut conn = pool.acquire().await?;
                conn.ping().await?;
            }
            DbPool::Sqlite(pool) => {
                let mut conn = pool.acquire().await?;
                conn.ping().await?;
            }
        }
        Ok(())
    }

    /// Close the pool. Safe to call more than once.
    pub async fn close(&self) {
        if self.is_closed() {
            return;
        }
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
        debug!(engine = %self.engine(), "Connection pool closed");
    }

    /// Check whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        match self {
            DbPool::Postgres(pool) => pool.is_closed(),
            DbPool::MySql(pool) => pool.is_closed(),
            DbPool::Sqlite(pool) => pool.is_closed(),
        }
    }
}

/// Close a pool, reporting teardown failures without escalating them.
pub async fn dispose(pool: &DbPool) {
    if pool.is_closed() {
        debug!("Pool already closed");
        return;
    }
    pool.close().await;
    if !pool.is_closed() {
        warn!("Connection pool did not report closed after dispose");
    }
}
