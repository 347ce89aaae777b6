//! Error types for stowage-core.

use std::time::Duration;

use miette::Diagnostic;
use stowage_config::error::ConfigError;
use stowage_db::DbError;
use thiserror::Error;

/// Core error type for repository operations.
#[derive(Error, Diagnostic, Debug)]
pub enum StowageError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error("{operation} timed out after {after:?}")]
    #[diagnostic(
        code(stowage::timeout),
        help("Raise fetch_timeout in the configuration, or set it to \"never\"")
    )]
    Timeout { operation: String, after: Duration },

    #[error("{operation} was cancelled")]
    #[diagnostic(code(stowage::cancelled))]
    Cancelled { operation: String },

    #[error("Background task failed: {0}")]
    #[diagnostic(
        code(stowage::task),
        help("This is an internal error, please report it")
    )]
    TaskJoin(String),

    #[error("Cache lock poisoned")]
    #[diagnostic(
        code(stowage::poison),
        help("This is an internal error, please report it")
    )]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StowageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

impl From<tokio::task::JoinError> for StowageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

pub type StowageResult<T> = std::result::Result<T, StowageError>;
