//! Error types for database column extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading table columns.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Table name contains invalid characters.
    #[error("invalid table name '{0}': must contain only alphanumeric characters and underscores")]
    InvalidTableName(String),

    /// Requested table does not exist in the source.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Catalog strategy was requested but the source has no catalog.
    #[error("column catalog unavailable for table '{0}'")]
    CatalogUnavailable(String),

    /// Row snapshot does not have a recognised shape.
    #[error("invalid row snapshot: {0}")]
    Snapshot(String),

    /// Snapshot file could not be read.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
