//! Statement safety policies for the execute path.
//!
//! Safe mode blocks destructive SQL before it reaches the database. The
//! default [`KeywordPolicy`] matches normalized substrings, which is a
//! deliberate over-approximation: a destructive marker inside a string
//! literal is rejected too. [`ParserPolicy`] is the stricter AST-based
//! substitute; both sit behind the [`StatementPolicy`] trait so the execute
//! contract never changes.

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Destructive markers rejected by the keyword policy, matched anywhere in
/// the normalized statement text.
pub const DESTRUCTIVE_MARKERS: &[&str] =
    &["delete from", "drop table", "drop database", "truncate table"];

/// A rejected statement, with the operation detected and the reason it is
/// blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub operation: String,
    pub reason: String,
}

impl PolicyViolation {
    fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Pluggable statement check applied before execution in safe mode.
pub trait StatementPolicy: Send + Sync {
    fn check(&self, sql: &str) -> Result<(), PolicyViolation>;
}

/// Substring-based policy.
///
/// Works on case-folded, trimmed text. Rejects any statement containing a
/// destructive marker and any UPDATE that carries no WHERE token. No SQL
/// parsing happens here, so markers inside string literals are rejected as
/// well.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPolicy;

impl StatementPolicy for KeywordPolicy {
    fn check(&self, sql: &str) -> Result<(), PolicyViolation> {
        let normalized = sql.trim().to_lowercase();

        for marker in DESTRUCTIVE_MARKERS {
            if normalized.contains(marker) {
                return Err(PolicyViolation::new(
                    marker.to_uppercase(),
                    "destructive statements are not allowed in safe mode",
                ));
            }
        }

        if normalized.starts_with("update") && !normalized.contains("where") {
            return Err(PolicyViolation::new(
                "UPDATE without WHERE",
                "UPDATE statements without a WHERE clause are not allowed in safe mode",
            ));
        }

        Ok(())
    }
}

/// AST-based policy.
///
/// Parses the statement with sqlparser and flags DROP TABLE/DATABASE,
/// TRUNCATE, and DELETE/UPDATE without a WHERE clause. Unparseable input is
/// rejected outright rather than falling back to substring matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserPolicy;

impl StatementPolicy for ParserPolicy {
    fn check(&self, sql: &str) -> Result<(), PolicyViolation> {
        let dialect = GenericDialect {};
        let statements = Parser::parse_sql(&dialect, sql).map_err(|e| {
            PolicyViolation::new(
                "unparseable statement",
                format!("failed to parse SQL statement: {e}"),
            )
        })?;

        if statements.is_empty() {
            return Err(PolicyViolation::new(
                "empty statement",
                "empty SQL statement",
            ));
        }

        for stmt in &statements {
            if let Some(violation) = check_statement(stmt) {
                return Err(violation);
            }
        }

        Ok(())
    }
}

fn check_statement(stmt: &Statement) -> Option<PolicyViolation> {
    use sqlparser::ast::ObjectType;

    match stmt {
        Statement::Drop { object_type, .. } => match object_type {
            ObjectType::Table => Some(PolicyViolation::new(
                "DROP TABLE",
                "this permanently deletes the table and all its data",
            )),
            ObjectType::Database | ObjectType::Schema => Some(PolicyViolation::new(
                "DROP DATABASE",
                "this permanently deletes the database and all its data",
            )),
            _ => None,
        },
        Statement::Truncate { .. } => Some(PolicyViolation::new(
            "TRUNCATE TABLE",
            "this removes all rows from the table",
        )),
        Statement::Delete(delete) if delete.selection.is_none() => Some(PolicyViolation::new(
            "DELETE without WHERE",
            "this deletes all rows from the table",
        )),
        Statement::Update(update) if update.selection.is_none() => Some(PolicyViolation::new(
            "UPDATE without WHERE",
            "this updates all rows in the table",
        )),
        _ => None,
    }
}
