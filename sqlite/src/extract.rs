//! Table column extraction with catalog and sample-row strategies.

use std::fmt;
use std::path::PathBuf;

use fieldmap_core::{FieldSet, Indeterminate, IndeterminateReason, SourceFields};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SqliteError};
use crate::source::{ColumnSource, SnapshotColumnSource, SqliteColumnSource};

/// How table columns are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ColumnStrategy {
    /// Catalog first, sample row when the catalog is unavailable.
    #[default]
    Auto,
    /// Catalog only.
    Catalog,
    /// Sample one row only.
    SampleRow,
}

impl fmt::Display for ColumnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Catalog => write!(f, "catalog"),
            Self::SampleRow => write!(f, "sample-row"),
        }
    }
}

/// Connection settings for the database namespace.
///
/// Built once from the project file or command line and passed to
/// [`open_column_source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, or a `.json` row snapshot.
    pub path: PathBuf,
    #[serde(default)]
    pub strategy: ColumnStrategy,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strategy: ColumnStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ColumnStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Whether [`path`](Self::path) names a JSON row snapshot.
    pub fn is_snapshot(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

/// Opens the column source named by `config`.
///
/// Paths ending in `.json` load a [`SnapshotColumnSource`]; anything else is
/// opened read-only as a SQLite database.
pub fn open_column_source(config: &DatabaseConfig) -> Result<Box<dyn ColumnSource>> {
    if config.is_snapshot() {
        debug!(path = %config.path.display(), "opening row snapshot");
        Ok(Box::new(SnapshotColumnSource::open(&config.path)?))
    } else {
        debug!(path = %config.path.display(), "opening sqlite database");
        Ok(Box::new(SqliteColumnSource::open(&config.path)?))
    }
}

/// Validates that a table name is a bare identifier.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidTableName`] if the name is empty or contains
/// characters other than alphanumerics and underscores.
pub fn validate_table_name(table: &str) -> Result<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidTableName(table.to_string()));
    }
    Ok(())
}

/// Reads the column names of `table`.
///
/// A table with no catalog entry and no rows cannot be described. That case
/// is reported as [`SourceFields::Indeterminate`] with
/// [`IndeterminateReason::EmptySample`], never as an empty known set, so
/// that callers do not mistake it for a table without columns. An empty
/// column list from the catalog, or a sampled row without keys, is a table
/// that really has no columns and comes back as an empty known set.
///
/// # Examples
///
/// ```
/// use fieldmap_core::SourceFields;
/// use fieldmap_sqlite::{ColumnStrategy, SnapshotColumnSource, extract_table_columns};
///
/// let empty = SnapshotColumnSource::from_json(r#"{"user_signup": []}"#).unwrap();
/// let fields = extract_table_columns(&empty, "user_signup", ColumnStrategy::Auto).unwrap();
/// assert!(matches!(fields, SourceFields::Indeterminate(_)));
/// ```
pub fn extract_table_columns<S: ColumnSource + ?Sized>(
    source: &S,
    table: &str,
    strategy: ColumnStrategy,
) -> Result<SourceFields> {
    validate_table_name(table)?;

    if strategy != ColumnStrategy::SampleRow {
        match source.catalog_columns(table)? {
            Some(columns) => {
                info!(table, columns = columns.len(), "columns read from catalog");
                return Ok(SourceFields::Known(columns.into_iter().collect::<FieldSet>()));
            }
            _ if strategy == ColumnStrategy::Catalog => {
                return Err(SqliteError::CatalogUnavailable(table.to_string()));
            }
            _ => debug!(table, "catalog unavailable; sampling one row"),
        }
    }

    match source.sample_row_keys(table)? {
        Some(keys) => {
            info!(table, columns = keys.len(), "columns read from sample row");
            Ok(SourceFields::Known(keys.into_iter().collect()))
        }
        None => {
            info!(table, "no rows to sample; columns are indeterminate");
            Ok(SourceFields::Indeterminate(Indeterminate::new(
                table,
                IndeterminateReason::EmptySample,
            )))
        }
    }
}
