//! Error types for stowage-db.

use miette::Diagnostic;
use thiserror::Error;

/// Database error type for stowage-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Cannot map field '{field}' of {table} ({type_name}) to a column type")]
    #[diagnostic(
        code(stowage_db::unsupported_field_type),
        help("Declare the field as text, integer, real, boolean, timestamp, binary or decimal")
    )]
    UnsupportedFieldType {
        table: String,
        field: String,
        type_name: String,
    },

    #[error("Schema migration of {table} failed at `{statement}`: {source}")]
    #[diagnostic(
        code(stowage_db::migration),
        help("No changes were recorded; the migration runs again on next access")
    )]
    SchemaMigration {
        table: String,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Unsupported query expression: {0}")]
    #[diagnostic(
        code(stowage_db::unsupported_expression),
        help("Filters must compare one declared field to a value with `eq`")
    )]
    UnsupportedExpression(String),

    #[error("Query against {table} failed: {source}")]
    #[diagnostic(code(stowage_db::query))]
    QueryExecution {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot open store {identity}: {source}")]
    #[diagnostic(
        code(stowage_db::connection),
        help("Check that the database path exists and is writable")
    )]
    Connection {
        identity: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Field '{field}' expects {expected} but got {found}")]
    #[diagnostic(
        code(stowage_db::field_value),
        help("The stored column type no longer matches the declared field type")
    )]
    FieldValue {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field '{field}' is not declared by {type_name}")]
    #[diagnostic(code(stowage_db::unknown_field))]
    UnknownField { type_name: String, field: String },

    #[error("Database lock poisoned")]
    #[diagnostic(
        code(stowage_db::poison),
        help("This is an internal error, please report it")
    )]
    Poisoned,
}

impl DbError {
    pub(crate) fn query(table: &str, source: rusqlite::Error) -> Self {
        Self::QueryExecution {
            table: table.to_string(),
            source,
        }
    }

    pub(crate) fn migration(table: &str, statement: &str, source: rusqlite::Error) -> Self {
        Self::SchemaMigration {
            table: table.to_string(),
            statement: statement.to_string(),
            source,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Result type alias for stowage-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
