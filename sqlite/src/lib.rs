//! Database column extraction.
//!
//! Reads the column names of one table so they can be reconciled against UI
//! and PDF fields. Two sources are supported:
//!
//! - **SQLite files**: columns come from `pragma_table_info`, with a
//!   one-row sample as fallback.
//! - **JSON row snapshots**: an export of table rows. There is no catalog, so
//!   a table with zero rows is reported as indeterminate.
//!
//! # Quick start
//!
//! ```no_run
//! use fieldmap_sqlite::{
//!     ColumnStrategy, DatabaseConfig, extract_table_columns, open_column_source,
//! };
//!
//! let config = DatabaseConfig::new("app.db").with_strategy(ColumnStrategy::Auto);
//! let source = open_column_source(&config).unwrap();
//! let columns = extract_table_columns(&source, "user_signup", config.strategy).unwrap();
//! if let Some(fields) = columns.fields() {
//!     println!("{} columns", fields.len());
//! }
//! ```

mod error;
mod extract;
mod source;

pub use error::{Result, SqliteError};
pub use extract::{
    ColumnStrategy, DatabaseConfig, extract_table_columns, open_column_source,
    validate_table_name,
};
pub use source::{ColumnSource, SnapshotColumnSource, SqliteColumnSource};
