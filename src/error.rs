//! Error types for the schema annotator.
//!
//! This module defines all error types using `thiserror`. The taxonomy
//! separates hard failures (bad configuration, blocked statements, an
//! inconsistent introspection snapshot) from read-path failures that callers
//! degrade to empty results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error(
        "Unsafe operation blocked: {operation}. {reason}. Disable safe mode to allow destructive statements."
    )]
    UnsafeOperation { operation: String, reason: String },

    #[error("Introspection failed: {message} (object: {object})")]
    Introspection { message: String, object: String },

    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Service error: {message}")]
    Service { message: String },
}

impl AnnotatorError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an unsafe operation error.
    pub fn unsafe_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsafeOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an introspection error.
    pub fn introspection(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Introspection {
            message: message.into(),
            object: object.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Check if this error is a hard fault that must be surfaced to the caller.
    /// Read-path callers degrade everything else to empty results.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::UnsafeOperation { .. } | Self::Introspection { .. }
        )
    }
}

/// Convert sqlx errors to AnnotatorError.
impl From<sqlx::Error> for AnnotatorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AnnotatorError::configuration(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AnnotatorError::execution(db_err.message().to_string(), code)
            }
            sqlx::Error::PoolTimedOut => {
                AnnotatorError::connection("Connection pool acquire timed out")
            }
            sqlx::Error::PoolClosed => AnnotatorError::connection("Connection pool is closed"),
            sqlx::Error::Io(io_err) => AnnotatorError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => {
                AnnotatorError::connection(format!("TLS error: {}", tls_err))
            }
            sqlx::Error::Protocol(msg) => {
                AnnotatorError::connection(format!("Protocol error: {}", msg))
            }
            sqlx::Error::TypeNotFound { type_name } => AnnotatorError::introspection(
                format!("Type not found: {}", type_name),
                type_name.to_string(),
            ),
            sqlx::Error::ColumnNotFound(col) => {
                AnnotatorError::introspection(format!("Column not found: {}", col), col.to_string())
            }
            sqlx::Error::ColumnDecode { index, source } => AnnotatorError::execution(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                AnnotatorError::execution(format!("Decode error: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => AnnotatorError::connection("Database worker crashed"),
            _ => AnnotatorError::execution(format!("Database error: {}", err), None),
        }
    }
}

/// Result type alias for annotator operations.
pub type AnnotatorResult<T> = Result<T, AnnotatorError>;
