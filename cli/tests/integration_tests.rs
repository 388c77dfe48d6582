use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lopdf::{Document, Object, StringFormat, dictionary};
use rusqlite::Connection;
use tempfile::TempDir;

const SIGNUP_HTML: &str = r#"<form id="signup">
  <input type="text" name="driver_name" required>
  <input type="email" name="driver_email">
  <input type="tel" name="driver_phone">
  <select name="vehicle_make"><option>VW</option></select>
  <button type="submit">Save</button>
</form>
"#;

const FILL_JS: &str = "const fill = (userData) => {
  setFieldText('email_address', userData.driver_email);
  setFieldText('drivr_name', userData.driver_name);
};
";

/// Project files shared by the tests: an HTML page, a SQLite database, a PDF
/// form and PDF-filling code.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("signup.html"), SIGNUP_HTML).unwrap();
        fs::write(dir.path().join("fill.js"), FILL_JS).unwrap();

        let conn = Connection::open(dir.path().join("app.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE user_signup (
                id INTEGER PRIMARY KEY,
                driver_name TEXT,
                driver_email TEXT,
                vehicle_make TEXT
            );",
        )
        .unwrap();
        drop(conn);

        write_pdf(
            &dir.path().join("form.pdf"),
            &["driver_name", "email_address", "other-full-name", "vehicle-make"],
        );
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn arg(&self, name: &str) -> String {
        self.path(name).to_str().unwrap().to_string()
    }
}

fn write_pdf(path: &Path, names: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let fields: Vec<Object> = names
        .iter()
        .map(|name| {
            Object::Reference(doc.add_object(dictionary! {
                "FT" => "Tx",
                "T" => Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
            }))
        })
        .collect();
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "AcroForm" => dictionary! { "Fields" => fields },
    });
    doc.trailer.set("Root", catalog);
    doc.save(path).expect("failed to write pdf");
}

fn fieldmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fieldmap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run fieldmap")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

#[test]
fn reconcile_ui_against_database_and_pdf_writes_csv() {
    let fx = Fixture::new();
    let report = fx.path("reports/reconciliation.csv");

    let out = fieldmap(&[
        "reconcile",
        "--html",
        &fx.arg("signup.html"),
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup",
        "--pdf",
        &fx.arg("form.pdf"),
        "--mapping",
        &fx.arg("fill.js"),
        "--output",
        report.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let csv = fs::read_to_string(&report).expect("report should be written");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "UI Field,In Supabase,In PDF,Status",
            "driver_phone,no,no,missing_supabase",
            "vehicle_make,yes,no,missing_pdf",
            "driver_email,yes,mapped:email_address,complete",
            "driver_name,yes,yes,complete",
        ]
    );

    let text = stdout(&out);
    assert!(text.contains("Missing from Supabase (1):"), "stdout: {text}");
    assert!(text.contains("Missing from PDF (1):"));
    assert!(text.contains("Complete (2):"));
}

#[test]
fn reconcile_with_database_primary_uses_mapping() {
    let fx = Fixture::new();
    let report = fx.path("db.csv");

    let out = fieldmap(&[
        "reconcile",
        "--primary",
        "database",
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup",
        "--pdf",
        &fx.arg("form.pdf"),
        "--mapping",
        &fx.arg("fill.js"),
        "--output",
        report.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let csv = fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Database Column,In PDF,Status",
            "id,no,missing_pdf",
            "vehicle_make,no,missing_pdf",
            "driver_email,mapped:email_address,complete",
            "driver_name,yes,complete",
        ]
    );
}

#[test]
fn reconcile_reports_empty_snapshot_as_indeterminate() {
    let fx = Fixture::new();
    let snapshot = fx.path("rows.json");
    fs::write(&snapshot, r#"{"user_signup": []}"#).unwrap();
    let report = fx.path("out.csv");

    let out = fieldmap(&[
        "reconcile",
        "--html",
        &fx.arg("signup.html"),
        "--db",
        snapshot.to_str().unwrap(),
        "--table",
        "user_signup",
        "--output",
        report.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Indeterminate (4):"), "stdout: {text}");
    assert!(text.contains("Indeterminate sources:\n  user_signup: no rows to sample"));

    let csv = fs::read_to_string(&report).unwrap();
    assert!(csv.starts_with("UI Field,In Supabase,Status\n"));
    assert!(csv.contains("driver_phone,unknown,indeterminate\n"));
}

#[test]
fn reconcile_survives_unreadable_downstream_pdf() {
    let fx = Fixture::new();
    let report = fx.path("out.csv");

    let out = fieldmap(&[
        "reconcile",
        "--html",
        &fx.arg("signup.html"),
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup",
        "--pdf",
        &fx.arg("missing.pdf"),
        "--output",
        report.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let csv = fs::read_to_string(&report).unwrap();
    assert!(csv.contains("driver_phone,no,unknown,missing_supabase\n"), "csv: {csv}");
    assert!(csv.contains("driver_name,yes,unknown,indeterminate\n"), "csv: {csv}");
    assert!(stdout(&out).contains("extraction failed"));
}

#[test]
fn reconcile_json_output_is_parseable() {
    let fx = Fixture::new();
    let out = fieldmap(&[
        "reconcile",
        "--html",
        &fx.arg("signup.html"),
        "--pdf",
        &fx.arg("form.pdf"),
        "--format",
        "json",
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).expect("valid JSON");
    assert_eq!(value["primary"], "ui");
    assert_eq!(value["stages"], serde_json::json!(["pdf"]));
    assert_eq!(value["results"].as_array().unwrap().len(), 4);
    assert_eq!(value["summary"]["complete"], 1);
}

#[test]
fn reconcile_reads_project_config() {
    let fx = Fixture::new();
    fs::write(
        fx.path("fieldmap.yaml"),
        "html: [signup.html]\n\
         database:\n  path: app.db\n\
         table: user_signup\n\
         pdf: form.pdf\n\
         mapping: fill.js\n\
         output: reports/out.csv\n",
    )
    .unwrap();

    let out = fieldmap(&["reconcile", "--config", &fx.arg("fieldmap.yaml")]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let csv = fs::read_to_string(fx.path("reports/out.csv")).expect("config output path used");
    assert!(csv.starts_with("UI Field,In Supabase,In PDF,Status\n"));
}

#[test]
fn reconcile_fails_on_unreadable_primary() {
    let fx = Fixture::new();
    let out = fieldmap(&[
        "reconcile",
        "--html",
        &fx.arg("nope.html"),
        "--pdf",
        &fx.arg("form.pdf"),
    ]);

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("error: "), "stderr: {err}");
    assert!(err.contains("nope.html"));
}

#[test]
fn reconcile_requires_a_downstream_source() {
    let fx = Fixture::new();
    let out = fieldmap(&["reconcile", "--html", &fx.arg("signup.html")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Nothing to reconcile against"));
}

#[test]
fn invalid_arguments_exit_with_one() {
    let out = fieldmap(&["reconcile", "--primary", "pdf"]);
    assert_eq!(out.status.code(), Some(1));

    let help = fieldmap(&["--help"]);
    assert!(help.status.success());
}

// ---------------------------------------------------------------------------
// Listing commands
// ---------------------------------------------------------------------------

#[test]
fn html_fields_lists_names_in_document_order() {
    let fx = Fixture::new();
    let out = fieldmap(&["html-fields", "--html", &fx.arg("signup.html")]);
    assert!(out.status.success());
    assert_eq!(
        stdout(&out),
        "UI fields (4):\n  driver_name\n  driver_email\n  driver_phone\n  vehicle_make\n"
    );
}

#[test]
fn db_columns_lists_catalog_columns() {
    let fx = Fixture::new();
    let out = fieldmap(&[
        "db-columns",
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "Columns of user_signup (4):\n  id\n  driver_name\n  driver_email\n  vehicle_make\n"
    );
}

#[test]
fn db_columns_rejects_bad_table_name() {
    let fx = Fixture::new();
    let out = fieldmap(&[
        "db-columns",
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup; DROP TABLE user_signup",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("invalid table name"));
}

#[test]
fn pdf_fields_lists_form_fields() {
    let fx = Fixture::new();
    let out = fieldmap(&["pdf-fields", "--pdf", &fx.arg("form.pdf"), "--format", "json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["driver_name", "email_address", "other-full-name", "vehicle-make"]
    );
}

#[test]
fn mapping_exports_csv() {
    let fx = Fixture::new();
    let csv_path = fx.path("mapping.csv");
    let out = fieldmap(&[
        "mapping",
        "--source",
        &fx.arg("fill.js"),
        "--output",
        csv_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "Database Column,PDF Field,Type,Line,Object\n\
         driver_email,email_address,TextField,2,userData\n\
         driver_name,drivr_name,TextField,3,userData\n"
    );
}

// ---------------------------------------------------------------------------
// Audit commands
// ---------------------------------------------------------------------------

#[test]
fn typos_suggests_closest_pdf_field() {
    let fx = Fixture::new();
    let csv_path = fx.path("typos.csv");
    let out = fieldmap(&[
        "typos",
        "--mapping",
        &fx.arg("fill.js"),
        "--pdf",
        &fx.arg("form.pdf"),
        "--output",
        csv_path.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("did you mean 'driver_name'?"));
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "Line,Database Column,PDF Field,Suggested Field,Distance,Confidence\n\
         3,driver_name,drivr_name,driver_name,1,high\n"
    );
}

#[test]
fn unmapped_lists_columns_without_mapping() {
    let fx = Fixture::new();
    let csv_path = fx.path("unmapped.csv");
    let out = fieldmap(&[
        "unmapped",
        "--db",
        &fx.arg("app.db"),
        "--table",
        "user_signup",
        "--mapping",
        &fx.arg("fill.js"),
        "--pdf",
        &fx.arg("form.pdf"),
        "--output",
        csv_path.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "Database Column,Suggested Field,Distance,Confidence\n\
         id,,,\n\
         vehicle_make,vehicle-make,1,high\n"
    );
}

#[test]
fn suggest_from_candidate_list() {
    let out = fieldmap(&[
        "suggest",
        "--field",
        "drivr_name",
        "--field",
        "zzzzzzzzzzzz",
        "--candidates",
        "driver_name,email",
        "--format",
        "json",
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["corrections"][0]["suggested_field"], "driver_name");
    assert_eq!(value["corrections"][0]["distance"], 1);
    assert_eq!(value["unmatched"], serde_json::json!(["zzzzzzzzzzzz"]));
}
