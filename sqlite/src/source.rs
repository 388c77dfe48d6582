//! Column sources: where table column names are read from.
//!
//! A [`ColumnSource`] offers two views of a table. The catalog lists declared
//! columns and works on empty tables; the sample row only sees columns of a
//! row that actually exists. Hosted databases often hide their catalog, so
//! callers fall back from one to the other in
//! [`extract_table_columns`](crate::extract_table_columns).

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SqliteError};

/// Read-only access to the column names of a table.
pub trait ColumnSource {
    /// Declared columns in catalog order, or `None` if the source has no
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::TableNotFound`] if the catalog has no such table.
    fn catalog_columns(&self, table: &str) -> Result<Option<Vec<String>>>;

    /// Keys of one sampled row, or `None` if the table has no rows.
    fn sample_row_keys(&self, table: &str) -> Result<Option<Vec<String>>>;
}

impl<S: ColumnSource + ?Sized> ColumnSource for Box<S> {
    fn catalog_columns(&self, table: &str) -> Result<Option<Vec<String>>> {
        (**self).catalog_columns(table)
    }

    fn sample_row_keys(&self, table: &str) -> Result<Option<Vec<String>>> {
        (**self).sample_row_keys(table)
    }
}

/// Column source backed by a SQLite database file.
///
/// Table names must already be validated; they are interpolated into the
/// sample query as a quoted identifier.
pub struct SqliteColumnSource {
    conn: Connection,
}

impl SqliteColumnSource {
    /// Opens an existing database read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wraps an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        )?;
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        Ok(count > 0)
    }
}

impl ColumnSource for SqliteColumnSource {
    fn catalog_columns(&self, table: &str) -> Result<Option<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(SqliteError::TableNotFound(table.to_string()));
        }
        debug!(table, columns = columns.len(), "read columns from catalog");
        Ok(Some(columns))
    }

    fn sample_row_keys(&self, table: &str) -> Result<Option<Vec<String>>> {
        if !self.table_exists(table)? {
            return Err(SqliteError::TableNotFound(table.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM \"{table}\" LIMIT 1"))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let has_row = stmt.query_row([], |_| Ok(())).optional()?.is_some();

        debug!(table, has_row, "sampled one row");
        Ok(has_row.then_some(names))
    }
}

/// Column source backed by a JSON export of table rows.
///
/// Two shapes are accepted: an array of row objects, which stands for every
/// table, or an object mapping table names to such arrays. Snapshots carry no
/// catalog, so only the sample-row view is available. Keys come back in
/// lexicographic order.
#[derive(Debug, Clone)]
pub struct SnapshotColumnSource {
    snapshot: Value,
}

impl SnapshotColumnSource {
    /// Reads and validates a snapshot file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SqliteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_value(snapshot: Value) -> Result<Self> {
        match &snapshot {
            Value::Array(_) => {}
            Value::Object(tables) => {
                if let Some((name, _)) = tables.iter().find(|(_, rows)| !rows.is_array()) {
                    return Err(SqliteError::Snapshot(format!(
                        "table '{name}' is not an array of rows"
                    )));
                }
            }
            _ => {
                return Err(SqliteError::Snapshot(
                    "expected an array of rows or an object of tables".to_string(),
                ));
            }
        }
        Ok(Self { snapshot })
    }

    fn rows(&self, table: &str) -> Result<&[Value]> {
        let rows = match &self.snapshot {
            Value::Array(rows) => rows,
            Value::Object(tables) => match tables.get(table) {
                Some(Value::Array(rows)) => rows,
                _ => return Err(SqliteError::TableNotFound(table.to_string())),
            },
            _ => return Err(SqliteError::Snapshot("unexpected snapshot shape".to_string())),
        };
        Ok(rows)
    }
}

impl ColumnSource for SnapshotColumnSource {
    fn catalog_columns(&self, _table: &str) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    fn sample_row_keys(&self, table: &str) -> Result<Option<Vec<String>>> {
        match self.rows(table)?.first() {
            None => Ok(None),
            Some(Value::Object(row)) => Ok(Some(row.keys().cloned().collect())),
            Some(_) => Err(SqliteError::Snapshot(format!(
                "first row of '{table}' is not an object"
            ))),
        }
    }
}
