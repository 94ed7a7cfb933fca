//! The schema extractor.
//!
//! Wraps a connection pool and exposes introspection, policied statement
//! execution, and teardown. Read-path methods (`list_tables`,
//! `list_columns`, `execute_query`) degrade to empty results on failure and
//! report the error through the log channel, keeping an interactive session
//! usable when metadata is partially unavailable; the `try_` variants return
//! the error instead. `extract_schema` is the exception: it either returns a
//! complete snapshot or fails.

use crate::config::ConnectionConfig;
use crate::db::executor::{self, ResultRow};
use crate::db::introspect;
use crate::db::pool::{self, DbPool};
use crate::error::{AnnotatorError, AnnotatorResult};
use crate::models::{ColumnDescriptor, SchemaMap};
use crate::policy::{KeywordPolicy, StatementPolicy};
use tracing::{error, info};

pub struct SchemaExtractor {
    pool: DbPool,
    config: ConnectionConfig,
    policy: Box<dyn StatementPolicy>,
}

impl SchemaExtractor {
    /// Build an extractor for the given configuration.
    ///
    /// The pool is created lazily; no network traffic happens here. The
    /// connection target is derived strictly from the fields of `config`.
    pub fn new(config: ConnectionConfig) -> AnnotatorResult<Self> {
        let pool = DbPool::connect(&config)?;
        Ok(Self {
            pool,
            config,
            policy: Box::new(KeywordPolicy),
        })
    }

    /// Replace the statement policy used in safe mode.
    pub fn with_policy(mut self, policy: Box<dyn StatementPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// The configuration this extractor was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Test the connection: acquire, round-trip, release.
    ///
    /// Reports a structured connection error instead of raising; the
    /// connection is not held past the call.
    pub async fn ping(&self) -> AnnotatorResult<()> {
        match self.pool.ping().await {
            Ok(()) => {
                info!(target = %self.config.masked_url(), "Connection successful");
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    e @ AnnotatorError::Connection { .. } => e,
                    other => AnnotatorError::connection(other.to_string()),
                };
                error!(error = %err, "Database connection test failed");
                Err(err)
            }
        }
    }

    /// List tables, or the error that prevented it.
    pub async fn try_list_tables(&self) -> AnnotatorResult<Vec<String>> {
        introspect::list_tables(&self.pool).await
    }

    /// List tables, degrading to an empty sequence on failure.
    pub async fn list_tables(&self) -> Vec<String> {
        match self.try_list_tables().await {
            Ok(tables) => tables,
            Err(err) => {
                error!(error = %err, "Failed to list tables; returning empty result");
                Vec::new()
            }
        }
    }

    /// List the columns of a table, or the error that prevented it.
    pub async fn try_list_columns(&self, table: &str) -> AnnotatorResult<Vec<ColumnDescriptor>> {
        introspect::list_columns(&self.pool, table).await
    }

    /// List the columns of a table, degrading to an empty sequence on failure.
    pub async fn list_columns(&self, table: &str) -> Vec<ColumnDescriptor> {
        match self.try_list_columns(table).await {
            Ok(columns) => columns,
            Err(err) => {
                error!(
                    error = %err,
                    table = %table,
                    "Failed to list columns; returning empty result"
                );
                Vec::new()
            }
        }
    }

    /// Extract the full schema as one consistent snapshot.
    ///
    /// Unlike the listing methods this does not degrade: a failure mid-call
    /// fails the whole extraction with an introspection error.
    pub async fn extract_schema(&self) -> AnnotatorResult<SchemaMap> {
        introspect::extract_schema(&self.pool).await
    }

    /// Execute an ad-hoc statement.
    ///
    /// In safe mode the statement policy runs first; a rejected statement
    /// fails with an unsafe-operation error and never reaches the database.
    /// Execution failures after the policy gate degrade to an empty result.
    pub async fn execute_query(&self, sql: &str) -> AnnotatorResult<Vec<ResultRow>> {
        if self.config.safe_mode {
            if let Err(violation) = self.policy.check(sql) {
                return Err(AnnotatorError::unsafe_operation(
                    violation.operation,
                    violation.reason,
                ));
            }
        }

        match executor::fetch_rows(&self.pool, sql).await {
            Ok(rows) => Ok(rows),
            Err(err) => {
                error!(error = %err, "Query execution failed; returning empty result");
                Ok(Vec::new())
            }
        }
    }

    /// Release all pooled connection resources. Safe to call more than once.
    pub async fn dispose(&self) {
        pool::dispose(&self.pool).await;
    }
}

impl std::fmt::Debug for SchemaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaExtractor")
            .field("engine", &self.config.engine)
            .field("target", &self.config.masked_url())
            .field("safe_mode", &self.config.safe_mode)
            .finish()
    }
}
