//! Integration tests for the fieldmap-sqlite crate.

use fieldmap_core::{FieldSet, IndeterminateReason, SourceFields};
use fieldmap_sqlite::{
    ColumnStrategy, DatabaseConfig, SnapshotColumnSource, SqliteError, extract_table_columns,
    open_column_source,
};
use rusqlite::Connection;

fn write_database(dir: &tempfile::TempDir, sql: &str) -> std::path::PathBuf {
    let path = dir.path().join("app.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(sql).unwrap();
    path
}

fn column_names(fields: &SourceFields) -> Vec<&str> {
    fields.fields().expect("known columns").iter().collect()
}

#[test]
fn test_sqlite_catalog_reads_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_database(
        &dir,
        "CREATE TABLE user_signup (id INTEGER PRIMARY KEY, email TEXT, driver_name TEXT);",
    );

    let config = DatabaseConfig::new(&path);
    let source = open_column_source(&config).unwrap();
    let fields = extract_table_columns(&source, "user_signup", config.strategy).unwrap();
    assert_eq!(column_names(&fields), vec!["id", "email", "driver_name"]);
}

#[test]
fn test_sqlite_sample_row_on_empty_table_is_indeterminate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_database(&dir, "CREATE TABLE incident_reports (id INTEGER, injured TEXT);");

    let config = DatabaseConfig::new(&path).with_strategy(ColumnStrategy::SampleRow);
    let source = open_column_source(&config).unwrap();
    let fields = extract_table_columns(&source, "incident_reports", config.strategy).unwrap();

    let indeterminate = fields.indeterminate().expect("indeterminate");
    assert_eq!(indeterminate.source, "incident_reports");
    assert_eq!(indeterminate.reason, IndeterminateReason::EmptySample);
}

#[test]
fn test_sqlite_sample_row_with_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_database(
        &dir,
        "CREATE TABLE incident_reports (id INTEGER, injured TEXT);
         INSERT INTO incident_reports VALUES (1, 'yes');",
    );

    let config = DatabaseConfig::new(&path).with_strategy(ColumnStrategy::SampleRow);
    let source = open_column_source(&config).unwrap();
    let fields = extract_table_columns(&source, "incident_reports", config.strategy).unwrap();
    assert_eq!(column_names(&fields), vec!["id", "injured"]);
}

#[test]
fn test_sqlite_missing_table_and_bad_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_database(&dir, "CREATE TABLE a (x TEXT);");
    let source = open_column_source(&DatabaseConfig::new(&path)).unwrap();

    assert!(matches!(
        extract_table_columns(&source, "b", ColumnStrategy::Auto),
        Err(SqliteError::TableNotFound(_))
    ));
    assert!(matches!(
        extract_table_columns(&source, "a; DROP TABLE a", ColumnStrategy::Auto),
        Err(SqliteError::InvalidTableName(_))
    ));
}

#[test]
fn test_missing_database_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path().join("absent.db"));
    assert!(matches!(
        open_column_source(&config),
        Err(SqliteError::Database(_))
    ));
    assert!(
        !dir.path().join("absent.db").exists(),
        "opening must not create the file"
    );
}

#[test]
fn test_snapshot_auto_falls_back_to_sample_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    std::fs::write(
        &path,
        r#"{
            "user_signup": [{"email": "a@b.c", "full_name": "A", "id": 1}],
            "incident_reports": []
        }"#,
    )
    .unwrap();

    let config = DatabaseConfig::new(&path);
    let source = open_column_source(&config).unwrap();

    let users = extract_table_columns(&source, "user_signup", ColumnStrategy::Auto).unwrap();
    assert_eq!(column_names(&users), vec!["email", "full_name", "id"]);

    let incidents =
        extract_table_columns(&source, "incident_reports", ColumnStrategy::Auto).unwrap();
    assert!(incidents.indeterminate().is_some());

    assert!(matches!(
        extract_table_columns(&source, "user_signup", ColumnStrategy::Catalog),
        Err(SqliteError::CatalogUnavailable(_))
    ));
}

#[test]
fn test_snapshot_missing_file_reports_path() {
    let config = DatabaseConfig::new("/nonexistent/rows.json");
    let err = open_column_source(&config).err().expect("open should fail");
    assert!(matches!(err, SqliteError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/rows.json"));
}

#[test]
fn test_snapshot_row_without_keys_is_zero_columns() {
    let source = SnapshotColumnSource::from_json(r#"{"audit_log": [{}]}"#).unwrap();
    let fields = extract_table_columns(&source, "audit_log", ColumnStrategy::Auto).unwrap();
    assert_eq!(fields, SourceFields::Known(FieldSet::new()));
}

#[test]
fn test_sqlite_extraction_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_database(
        &dir,
        "CREATE TABLE user_signup (id INTEGER, email TEXT, driver_name TEXT);
         INSERT INTO user_signup VALUES (1, 'a@b.c', 'A');",
    );
    let config = DatabaseConfig::new(&path);
    let source = open_column_source(&config).unwrap();

    for strategy in [ColumnStrategy::Catalog, ColumnStrategy::SampleRow] {
        let first = extract_table_columns(&source, "user_signup", strategy).unwrap();
        let second = extract_table_columns(&source, "user_signup", strategy).unwrap();
        assert_eq!(first, second, "{strategy}");
        assert_eq!(column_names(&first), vec!["id", "email", "driver_name"]);
    }
}

#[test]
fn test_snapshot_extraction_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    std::fs::write(
        &path,
        r#"{"user_signup": [{"id": 1, "email": "a@b.c", "driver_name": "A"}]}"#,
    )
    .unwrap();

    let read = || {
        let source = open_column_source(&DatabaseConfig::new(&path)).unwrap();
        extract_table_columns(&source, "user_signup", ColumnStrategy::Auto).unwrap()
    };
    let first = read();
    assert_eq!(first, read());
    assert_eq!(column_names(&first), vec!["driver_name", "email", "id"]);
}
