//! Console output formatting for field listings and reports.

use std::borrow::Cow;

use fieldmap_core::{
    Correction, FieldSet, MappingTable, Presence, ReconcileStatus, ReconciliationResult,
    SourceFields, TypoFinding, UnmappedColumn,
};
use serde::Serialize;

use crate::pdf::PdfField;
use crate::report::ReconciliationReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Plain text grouped by status.
    #[default]
    Table,
    Markdown,
    Json,
    Yaml,
}

fn serialize<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => Some(
            serde_json::to_string_pretty(value)
                .map_err(|e| format!("JSON serialization failed: {e}")),
        ),
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")),
        ),
        OutputFormat::Table | OutputFormat::Markdown => None,
    }
}

/// Formats a reconciliation report.
pub fn format_reconciliation(
    report: &ReconciliationReport,
    format: OutputFormat,
) -> Result<String, String> {
    if let Some(serialized) = serialize(report, format) {
        return serialized;
    }
    Ok(match format {
        OutputFormat::Markdown => reconciliation_to_markdown(report),
        _ => reconciliation_to_table(report),
    })
}

fn presence_cells(report: &ReconciliationReport, result: &ReconciliationResult) -> Vec<String> {
    report
        .stages
        .iter()
        .map(|stage| {
            let cell = result.presence(*stage).map_or(Cow::Borrowed("-"), Presence::cell);
            format!("{stage}: {cell}")
        })
        .collect()
}

fn reconciliation_to_table(report: &ReconciliationReport) -> String {
    let mut out = String::new();

    let stages: Vec<String> = report.stages.iter().map(ToString::to_string).collect();
    out.push_str(&format!(
        "Reconciliation of {} from {}  (stages: {})\n",
        report.primary.label(),
        report.primary_source,
        stages.join(" -> ")
    ));
    let counts: Vec<String> = report
        .summary
        .iter()
        .map(|(status, count)| format!("{count} {status}"))
        .collect();
    out.push_str(&format!(
        "  {} field(s): {}\n",
        report.results.len(),
        counts.join(", ")
    ));

    let width = report
        .results
        .iter()
        .map(|r| r.field.len())
        .max()
        .unwrap_or(5);

    for status in ReconcileStatus::ALL {
        let group: Vec<_> = report.with_status(status).collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} ({}):\n", status.heading(), group.len()));
        for result in group {
            out.push_str(&format!(
                "  {:<width$}  {}\n",
                result.field,
                presence_cells(report, result).join("  "),
                width = width
            ));
        }
    }

    if !report.indeterminate.is_empty() {
        out.push_str("\nIndeterminate sources:\n");
        for source in &report.indeterminate {
            out.push_str(&format!("  {source}\n"));
        }
    }

    if !report.mapping_warnings.is_empty() {
        out.push_str("\nMapping warnings:\n");
        for warning in &report.mapping_warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }

    out
}

fn reconciliation_to_markdown(report: &ReconciliationReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Field reconciliation: {}\n\n", report.primary_source));
    out.push_str(&format!("**Generated:** {}\n\n", report.generated_at));

    out.push_str("| Status | Count |\n");
    out.push_str("|--------|-------|\n");
    for (status, count) in &report.summary {
        out.push_str(&format!("| {} | {count} |\n", status.heading()));
    }
    out.push('\n');

    out.push_str(&format!("| {} |", report.primary.label()));
    for stage in &report.stages {
        out.push_str(&format!(" {} |", stage.label()));
    }
    out.push_str(" Status |\n|");
    for _ in 0..report.stages.len() + 2 {
        out.push_str("---|");
    }
    out.push('\n');
    for result in &report.results {
        out.push_str(&format!("| `{}` |", result.field));
        for stage in &report.stages {
            let cell = result.presence(*stage).map_or(Cow::Borrowed(""), Presence::cell);
            out.push_str(&format!(" {cell} |"));
        }
        out.push_str(&format!(" {} |\n", result.status));
    }

    if !report.indeterminate.is_empty() {
        out.push_str("\n## Indeterminate sources\n\n");
        for source in &report.indeterminate {
            out.push_str(&format!("- `{}`: {}\n", source.source, source.reason));
        }
    }
    if !report.mapping_warnings.is_empty() {
        out.push_str("\n## Mapping warnings\n\n");
        for warning in &report.mapping_warnings {
            out.push_str(&format!("- {warning}\n"));
        }
    }

    out
}

/// Formats a flat list of field names.
pub fn format_field_list(
    title: &str,
    fields: &FieldSet,
    format: OutputFormat,
) -> Result<String, String> {
    if let Some(serialized) = serialize(fields, format) {
        return serialized;
    }
    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            out.push_str(&format!("## {title} ({})\n\n", fields.len()));
            for field in fields.iter() {
                out.push_str(&format!("- `{field}`\n"));
            }
        }
        _ => {
            out.push_str(&format!("{title} ({}):\n", fields.len()));
            for field in fields.iter() {
                out.push_str(&format!("  {field}\n"));
            }
        }
    }
    Ok(out)
}

/// Formats a source that may be indeterminate.
pub fn format_source_fields(
    title: &str,
    fields: &SourceFields,
    format: OutputFormat,
) -> Result<String, String> {
    match fields {
        SourceFields::Known(set) => format_field_list(title, set, format),
        SourceFields::Indeterminate(indeterminate) => {
            if let Some(serialized) = serialize(fields, format) {
                return serialized;
            }
            Ok(format!("{title}: indeterminate\n  {indeterminate}\n"))
        }
    }
}

/// Formats PDF form fields with their kinds.
pub fn format_pdf_fields(fields: &[PdfField], format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(fields, format) {
        return serialized;
    }
    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            out.push_str("| PDF Field | Kind |\n|---|---|\n");
            for field in fields {
                out.push_str(&format!("| `{}` | {} |\n", field.name, field.kind));
            }
        }
        _ => {
            let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(4);
            out.push_str(&format!("{} PDF form field(s):\n", fields.len()));
            for field in fields {
                out.push_str(&format!("  {:<width$}  {}\n", field.name, field.kind, width = width));
            }
        }
    }
    Ok(out)
}

/// Formats a mapping table with its warnings.
pub fn format_mapping(table: &MappingTable, format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(table, format) {
        return serialized;
    }
    let mut out = String::new();
    match format {
        OutputFormat::Markdown => {
            out.push_str("| Line | Database Column | PDF Field | Type |\n|---|---|---|---|\n");
            for entry in &table.entries {
                out.push_str(&format!(
                    "| {} | `{}` | `{}` | {} |\n",
                    entry.line, entry.source_field, entry.target_field, entry.kind
                ));
            }
        }
        _ => {
            let width = table
                .entries
                .iter()
                .map(|e| e.source_field.len())
                .max()
                .unwrap_or(6);
            out.push_str(&format!("{} mapping(s):\n", table.len()));
            for entry in &table.entries {
                out.push_str(&format!(
                    "  {:>5}  {:<width$} -> {}  ({})\n",
                    entry.line,
                    entry.source_field,
                    entry.target_field,
                    entry.kind,
                    width = width
                ));
            }
        }
    }
    if !table.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &table.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }
    Ok(out)
}

fn suggestion_text(correction: Option<&Correction>) -> String {
    match correction {
        Some(fix) => format!(
            "did you mean '{}'? (distance {}, {} confidence)",
            fix.suggested_field, fix.distance, fix.confidence
        ),
        None => "no close match".to_string(),
    }
}

/// Formats mapping targets that are missing from the PDF.
pub fn format_typos(typos: &[TypoFinding], format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(typos, format) {
        return serialized;
    }
    let mut out = String::new();
    if typos.is_empty() {
        out.push_str("Every mapped PDF field exists in the form.\n");
        return Ok(out);
    }
    match format {
        OutputFormat::Markdown => {
            out.push_str("| Line | PDF Field | Suggestion |\n|---|---|---|\n");
            for typo in typos {
                out.push_str(&format!(
                    "| {} | `{}` | {} |\n",
                    typo.line,
                    typo.target_field,
                    suggestion_text(typo.correction.as_ref())
                ));
            }
        }
        _ => {
            out.push_str(&format!("{} mapped PDF field(s) not found in the form:\n", typos.len()));
            for typo in typos {
                out.push_str(&format!(
                    "  line {:>4}  '{}' (from {}): {}\n",
                    typo.line,
                    typo.target_field,
                    typo.source_field,
                    suggestion_text(typo.correction.as_ref())
                ));
            }
        }
    }
    Ok(out)
}

/// Formats database columns that no mapping writes.
pub fn format_unmapped(
    unmapped: &[UnmappedColumn],
    format: OutputFormat,
) -> Result<String, String> {
    if let Some(serialized) = serialize(unmapped, format) {
        return serialized;
    }
    let mut out = String::new();
    if unmapped.is_empty() {
        out.push_str("Every column is mapped to a PDF field.\n");
        return Ok(out);
    }
    match format {
        OutputFormat::Markdown => {
            out.push_str("| Database Column | Suggestion |\n|---|---|\n");
            for column in unmapped {
                out.push_str(&format!(
                    "| `{}` | {} |\n",
                    column.column,
                    suggestion_text(column.correction.as_ref())
                ));
            }
        }
        _ => {
            out.push_str(&format!("{} unmapped column(s):\n", unmapped.len()));
            for column in unmapped {
                out.push_str(&format!(
                    "  {}: {}\n",
                    column.column,
                    suggestion_text(column.correction.as_ref())
                ));
            }
        }
    }
    Ok(out)
}

/// Formats ad-hoc correction suggestions.
pub fn format_corrections(
    corrections: &[Correction],
    unmatched: &[String],
    format: OutputFormat,
) -> Result<String, String> {
    #[derive(Serialize)]
    struct Suggestions<'a> {
        corrections: &'a [Correction],
        unmatched: &'a [String],
    }
    if let Some(serialized) = serialize(
        &Suggestions {
            corrections,
            unmatched,
        },
        format,
    ) {
        return serialized;
    }
    let mut out = String::new();
    for fix in corrections {
        out.push_str(&format!(
            "{} -> {}  (distance {}, {})\n",
            fix.wrong_field, fix.suggested_field, fix.distance, fix.confidence
        ));
    }
    for field in unmatched {
        out.push_str(&format!("{field}: no suggestion within threshold\n"));
    }
    Ok(out)
}
