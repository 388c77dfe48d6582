mod config;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fieldmap_core::{
    DEFAULT_MAX_DISTANCE, Downstream, FieldSet, Indeterminate, IndeterminateReason, MappingTable,
    Namespace, SourceFields, Stage, find_target_typos, find_unmapped_columns, reconcile,
    suggest_all,
};
use fieldmap_discovery::artifact::{
    write_artifact, write_corrections_csv, write_mapping_csv, write_reconciliation_csv,
    write_typos_csv, write_unmapped_csv,
};
use fieldmap_discovery::html::extract_html_files;
use fieldmap_discovery::mapping::load_mapping;
use fieldmap_discovery::output::{self, OutputFormat};
use fieldmap_discovery::pdf::{PdfField, extract_pdf_fields, pdf_field_set};
use fieldmap_discovery::report::ReconciliationReport;
use fieldmap_sqlite::{ColumnStrategy, DatabaseConfig, extract_table_columns, open_column_source};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Primary, ProjectConfig};

#[derive(Debug, Parser)]
#[command(name = "fieldmap")]
#[command(version)]
#[command(about = "Reconcile field names across HTML forms, database columns and PDF forms")]
struct Cli {
    /// Project file (YAML) supplying default paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List form field names found in HTML pages.
    HtmlFields(HtmlFieldsArgs),
    /// List AcroForm fields of a PDF template.
    PdfFields(PdfFieldsArgs),
    /// List the columns of a database table.
    DbColumns(DbColumnsArgs),
    /// Build the column-to-PDF-field mapping from filling code.
    Mapping(MappingArgs),
    /// Check every primary field against the downstream namespaces.
    Reconcile(ReconcileArgs),
    /// Find mapped PDF field names that do not exist in the form.
    Typos(TyposArgs),
    /// Find database columns that no mapping writes to the PDF.
    Unmapped(UnmappedArgs),
    /// Suggest the closest known field name for a misspelled one.
    Suggest(SuggestArgs),
}

#[derive(Debug, Args)]
struct HtmlFieldsArgs {
    /// HTML pages, unioned in argument order.
    #[arg(long, num_args = 1..)]
    html: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct PdfFieldsArgs {
    /// PDF template.
    #[arg(long)]
    pdf: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// SQLite database, or a JSON row snapshot (`.json`).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Table to read columns from.
    #[arg(long)]
    table: Option<String>,
    /// How columns are discovered.
    #[arg(long, value_enum)]
    strategy: Option<ColumnStrategy>,
}

#[derive(Debug, Args)]
struct DbColumnsArgs {
    #[command(flatten)]
    database: DatabaseArgs,
}

#[derive(Debug, Args)]
struct MappingArgs {
    /// PDF-filling source code, or a mapping CSV.
    #[arg(long)]
    source: Option<PathBuf>,
    /// Write the mapping table as CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ReconcileArgs {
    /// HTML pages forming the UI namespace.
    #[arg(long, num_args = 1..)]
    html: Vec<PathBuf>,
    #[command(flatten)]
    database: DatabaseArgs,
    /// PDF template.
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Mapping source used to translate columns into PDF field names.
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Namespace whose fields are checked downstream.
    #[arg(long, value_enum)]
    primary: Option<Primary>,
    /// Write the report as CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct TyposArgs {
    /// Mapping source.
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// PDF template.
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Largest edit distance accepted as a suggestion.
    #[arg(long)]
    max_distance: Option<usize>,
    /// Write findings as CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct UnmappedArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Mapping source.
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// PDF template; enables suggestions among unused PDF fields.
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Largest edit distance accepted as a suggestion.
    #[arg(long)]
    max_distance: Option<usize>,
    /// Write findings as CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    /// Misspelled field name; repeatable.
    #[arg(long, required = true)]
    field: Vec<String>,
    /// Take candidates from this PDF's fields.
    #[arg(long, conflicts_with = "candidates")]
    pdf: Option<PathBuf>,
    /// Comma-separated candidate names.
    #[arg(long, value_delimiter = ',')]
    candidates: Vec<String>,
    /// Largest edit distance accepted as a suggestion.
    #[arg(long)]
    max_distance: Option<usize>,
    /// Write suggestions as CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let result = ProjectConfig::load_optional(cli.config.as_deref()).and_then(|config| {
        let format = cli.format;
        match cli.command {
            Command::HtmlFields(args) => run_html_fields(args, &config, format),
            Command::PdfFields(args) => run_pdf_fields(args, &config, format),
            Command::DbColumns(args) => run_db_columns(args, &config, format),
            Command::Mapping(args) => run_mapping(args, &config, format),
            Command::Reconcile(args) => run_reconcile(args, &config, format),
            Command::Typos(args) => run_typos(args, &config, format),
            Command::Unmapped(args) => run_unmapped(args, &config, format),
            Command::Suggest(args) => run_suggest(args, &config, format),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so that stdout stays parseable; `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Argument resolution
// ---------------------------------------------------------------------------

fn required<T>(value: Option<T>, flag: &str, key: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("Missing {flag} (or `{key}` in the config file)"))
}

fn html_paths(args: Vec<PathBuf>, config: &ProjectConfig) -> Result<Vec<PathBuf>, String> {
    let paths = if args.is_empty() {
        config.html.clone()
    } else {
        args
    };
    if paths.is_empty() {
        return Err("Missing --html (or `html` in the config file)".to_string());
    }
    Ok(paths)
}

/// Database settings from flags and config; `None` when no database is named.
fn database_settings(
    args: DatabaseArgs,
    config: &ProjectConfig,
) -> Result<Option<(DatabaseConfig, String)>, String> {
    let mut database = match (args.db, &config.database) {
        (Some(path), configured) => {
            let strategy = configured.as_ref().map(|c| c.strategy).unwrap_or_default();
            DatabaseConfig::new(path).with_strategy(strategy)
        }
        (None, Some(configured)) => configured.clone(),
        (None, None) => {
            if args.table.is_some() {
                return Err("--table requires --db (or `database` in the config file)".to_string());
            }
            return Ok(None);
        }
    };
    if let Some(strategy) = args.strategy {
        database.strategy = strategy;
    }
    let table = required(args.table.or_else(|| config.table.clone()), "--table", "table")?;
    Ok(Some((database, table)))
}

fn max_distance(arg: Option<usize>, config: &ProjectConfig) -> usize {
    arg.or(config.max_distance).unwrap_or(DEFAULT_MAX_DISTANCE)
}

// ---------------------------------------------------------------------------
// Source loading
// ---------------------------------------------------------------------------

fn load_html(paths: &[PathBuf]) -> Result<FieldSet, String> {
    let fields = extract_html_files(paths).map_err(|err| err.to_string())?;
    info!(pages = paths.len(), fields = fields.len(), "read UI fields");
    Ok(fields)
}

fn load_pdf(path: &Path) -> Result<Vec<PdfField>, String> {
    let fields = extract_pdf_fields(path).map_err(|err| err.to_string())?;
    info!(path = %path.display(), fields = fields.len(), "read PDF fields");
    Ok(fields)
}

fn load_columns(database: &DatabaseConfig, table: &str) -> Result<SourceFields, String> {
    let source = open_column_source(database).map_err(|err| {
        format!("Failed to open database '{}': {err}", database.path.display())
    })?;
    extract_table_columns(&source, table, database.strategy).map_err(|err| err.to_string())
}

fn load_mapping_table(path: &Path) -> Result<MappingTable, String> {
    let table = load_mapping(path).map_err(|err| err.to_string())?;
    for warning in &table.warnings {
        warn!(path = %path.display(), "{warning}");
    }
    Ok(table)
}

/// Turns a failed downstream read into an indeterminate source.
fn downstream_fields(label: &str, result: Result<SourceFields, String>) -> SourceFields {
    result.unwrap_or_else(|err| {
        warn!(source = label, error = %err, "downstream source unreadable");
        SourceFields::Indeterminate(Indeterminate::new(
            label,
            IndeterminateReason::ExtractionFailed(err),
        ))
    })
}

/// Prints rendered output, ending it with a newline.
fn emit(text: String) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

fn write_output<F>(path: &Path, what: &str, write: F) -> Result<(), String>
where
    F: FnOnce(std::fs::File) -> fieldmap_discovery::Result<()>,
{
    write_artifact(path, write)
        .map_err(|err| format!("Failed to write {what} '{}': {err}", path.display()))?;
    eprintln!("Wrote {what} to '{}'.", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Listing commands
// ---------------------------------------------------------------------------

fn run_html_fields(
    args: HtmlFieldsArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let paths = html_paths(args.html, config)?;
    let fields = load_html(&paths)?;
    emit(output::format_field_list("UI fields", &fields, format)?);
    Ok(())
}

fn run_pdf_fields(
    args: PdfFieldsArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let pdf = required(args.pdf.or_else(|| config.pdf.clone()), "--pdf", "pdf")?;
    let fields = load_pdf(&pdf)?;
    emit(output::format_pdf_fields(&fields, format)?);
    Ok(())
}

fn run_db_columns(
    args: DbColumnsArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let (database, table) =
        required(database_settings(args.database, config)?, "--db", "database")?;
    let columns = load_columns(&database, &table)?;
    let title = format!("Columns of {table}");
    emit(output::format_source_fields(&title, &columns, format)?);
    Ok(())
}

fn run_mapping(
    args: MappingArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let source = required(args.source.or_else(|| config.mapping.clone()), "--source", "mapping")?;
    let table = load_mapping_table(&source)?;
    emit(output::format_mapping(&table, format)?);

    if let Some(path) = args.output {
        write_output(&path, "mapping", |file| write_mapping_csv(file, &table))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// reconcile command
// ---------------------------------------------------------------------------

fn run_reconcile(
    args: ReconcileArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let primary_kind = args.primary.or(config.primary).unwrap_or_default();
    let pdf_path = args.pdf.or_else(|| config.pdf.clone());
    let mapping_path = args.mapping.or_else(|| config.mapping.clone());
    let output_path = args.output.or_else(|| config.output.clone());
    let database = database_settings(args.database, config)?;

    let mapping = mapping_path.as_deref().map(load_mapping_table).transpose()?;

    // UI pages are read before the downstream sources so a bad path fails fast.
    let html = match primary_kind {
        Primary::Ui => {
            let paths = html_paths(args.html, config)?;
            let fields = load_html(&paths)?;
            let label = paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Some((fields, label))
        }
        Primary::Database => None,
    };
    if primary_kind == Primary::Database && database.is_none() {
        return Err("Primary 'database' needs --db and --table".to_string());
    }

    let (db_result, pdf_result) = rayon::join(
        || {
            database
                .as_ref()
                .map(|(db, table)| load_columns(db, table))
        },
        || {
            pdf_path.as_deref().map(|path| {
                load_pdf(path).map(|fields| SourceFields::Known(pdf_field_set(&fields)))
            })
        },
    );

    let pdf_fields = pdf_path
        .as_deref()
        .zip(pdf_result)
        .map(|(path, result)| downstream_fields(&path.display().to_string(), result));

    let (primary, primary_namespace, primary_source, db_fields) = match (html, database.as_ref()) {
        (Some((fields, label)), db) => {
            let db_fields = db
                .zip(db_result)
                .map(|((_, table), result)| downstream_fields(table, result));
            (fields, Namespace::Ui, label, db_fields)
        }
        (None, Some((_, table))) => {
            let columns = db_result
                .ok_or_else(|| "Primary 'database' needs --db and --table".to_string())??;
            match columns {
                SourceFields::Known(fields) => (fields, Namespace::Database, table.clone(), None),
                SourceFields::Indeterminate(indeterminate) => {
                    return Err(format!("Primary source is indeterminate: {indeterminate}"));
                }
            }
        }
        (None, None) => return Err("Primary 'database' needs --db and --table".to_string()),
    };

    let mut stages = Vec::new();
    if let Some(fields) = &db_fields {
        stages.push(Downstream::new(Stage::Supabase, fields));
    }
    if let Some(fields) = &pdf_fields {
        let stage = Downstream::new(Stage::Pdf, fields);
        stages.push(match &mapping {
            Some(table) => stage.with_mapping(table),
            None => stage,
        });
    }
    if stages.is_empty() {
        return Err("Nothing to reconcile against: give --db/--table or --pdf".to_string());
    }

    let results = reconcile(&primary, &stages);
    let indeterminate: Vec<Indeterminate> = stages
        .iter()
        .filter_map(|stage| stage.fields.indeterminate().cloned())
        .collect();
    let report = ReconciliationReport::new(
        primary_namespace,
        primary_source,
        stages.iter().map(|stage| stage.stage).collect(),
        results,
    )
    .with_indeterminate(indeterminate)
    .with_mapping_warnings(
        mapping
            .as_ref()
            .map(|table| table.warnings.clone())
            .unwrap_or_default(),
    );

    info!(
        fields = report.results.len(),
        incomplete = report.incomplete_count(),
        "reconciliation finished"
    );
    emit(output::format_reconciliation(&report, format)?);

    if let Some(path) = output_path {
        write_output(&path, "report", |file| write_reconciliation_csv(file, &report))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Audit commands
// ---------------------------------------------------------------------------

fn run_typos(args: TyposArgs, config: &ProjectConfig, format: OutputFormat) -> Result<(), String> {
    let mapping_path = required(
        args.mapping.or_else(|| config.mapping.clone()),
        "--mapping",
        "mapping",
    )?;
    let pdf_path = required(args.pdf.or_else(|| config.pdf.clone()), "--pdf", "pdf")?;
    let max_distance = max_distance(args.max_distance, config);

    let mapping = load_mapping_table(&mapping_path)?;
    let pdf_fields = pdf_field_set(&load_pdf(&pdf_path)?);
    let typos = find_target_typos(&mapping, &pdf_fields, max_distance);
    emit(output::format_typos(&typos, format)?);

    if let Some(path) = args.output {
        write_output(&path, "typo report", |file| write_typos_csv(file, &typos))?;
    }
    Ok(())
}

fn run_unmapped(
    args: UnmappedArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let (database, table) =
        required(database_settings(args.database, config)?, "--db", "database")?;
    let mapping_path = required(
        args.mapping.or_else(|| config.mapping.clone()),
        "--mapping",
        "mapping",
    )?;
    let pdf_path = args.pdf.or_else(|| config.pdf.clone());
    let max_distance = max_distance(args.max_distance, config);

    let columns = match load_columns(&database, &table)? {
        SourceFields::Known(columns) => columns,
        SourceFields::Indeterminate(indeterminate) => {
            return Err(format!("Cannot list unmapped columns: {indeterminate}"));
        }
    };
    let mapping = load_mapping_table(&mapping_path)?;
    let pdf_fields = pdf_path
        .as_deref()
        .map(|path| load_pdf(path).map(|fields| pdf_field_set(&fields)))
        .transpose()?;

    let unmapped = find_unmapped_columns(&columns, &mapping, pdf_fields.as_ref(), max_distance);
    emit(output::format_unmapped(&unmapped, format)?);

    if let Some(path) = args.output {
        write_output(&path, "unmapped report", |file| write_unmapped_csv(file, &unmapped))?;
    }
    Ok(())
}

fn run_suggest(
    args: SuggestArgs,
    config: &ProjectConfig,
    format: OutputFormat,
) -> Result<(), String> {
    let candidates: FieldSet = if args.candidates.is_empty() {
        let pdf = required(
            args.pdf.or_else(|| config.pdf.clone()),
            "--pdf or --candidates",
            "pdf",
        )?;
        pdf_field_set(&load_pdf(&pdf)?)
    } else {
        args.candidates
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect()
    };
    let max_distance = max_distance(args.max_distance, config);

    let (corrections, unmatched) =
        suggest_all(args.field.iter().map(String::as_str), &candidates, max_distance);
    emit(output::format_corrections(&corrections, &unmatched, format)?);

    if let Some(path) = args.output {
        write_output(&path, "suggestions", |file| {
            write_corrections_csv(file, &corrections, &unmatched)
        })?;
    }
    Ok(())
}
