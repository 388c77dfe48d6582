//! CSV artifacts written next to console reports.
//!
//! Every writer here has a matching reader so an artifact from one run can
//! feed the next (a curated mapping CSV, or a previous reconciliation to diff
//! against). Quoting is delegated to the `csv` crate; field names containing
//! commas or quotes survive a round trip.

use std::io::{Read, Write};
use std::path::Path;

use fieldmap_core::{
    Correction, FieldMapping, MappingTable, Namespace, Presence, ReconcileStatus,
    ReconciliationResult, Stage, TypoFinding, UnmappedColumn,
};

use crate::error::{DiscoveryError, Result};
use crate::report::ReconciliationReport;

const STATUS_HEADER: &str = "Status";

const MAPPING_HEADERS: [&str; 5] = ["Database Column", "PDF Field", "Type", "Line", "Object"];

/// Writes the reconciliation table.
///
/// Header: the primary namespace label, one column per stage that took part
/// in the run (`In Supabase`, `In PDF`), then `Status`. Rows keep the
/// report's deterministic order.
pub fn write_reconciliation_csv<W: Write>(writer: W, report: &ReconciliationReport) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec![report.primary.label()];
    header.extend(report.stages.iter().map(|stage| stage.label()));
    header.push(STATUS_HEADER);
    csv.write_record(&header)?;

    for result in &report.results {
        let mut row = vec![result.field.clone()];
        for stage in &report.stages {
            let cell = result.presence(*stage).map(Presence::cell);
            row.push(cell.unwrap_or_default().into_owned());
        }
        row.push(result.status.to_string());
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Parses a table written by [`write_reconciliation_csv`].
///
/// The first column is the field; stage columns are recognized by header.
pub fn read_reconciliation_csv<R: Read>(reader: R) -> Result<Vec<ReconciliationResult>> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();

    let label = headers.get(0).unwrap_or_default();
    if ![Namespace::Ui, Namespace::Database, Namespace::Pdf]
        .iter()
        .any(|ns| ns.label() == label)
    {
        return Err(DiscoveryError::InvalidCsv(format!(
            "unexpected first column '{label}'"
        )));
    }
    let column = |name: &str| headers.iter().position(|h| h == name);
    let supabase_col = column(Stage::Supabase.label());
    let pdf_col = column(Stage::Pdf.label());
    let status_col = column(STATUS_HEADER)
        .ok_or_else(|| DiscoveryError::InvalidCsv("missing Status column".to_string()))?;

    let mut results = Vec::new();
    for record in csv.records() {
        let record = record?;
        let presence =
            |col: Option<usize>| col.and_then(|i| record.get(i)).map(Presence::from_cell);
        let status_text = record.get(status_col).unwrap_or_default();
        let status: ReconcileStatus = status_text
            .parse()
            .map_err(|err| DiscoveryError::InvalidCsv(format!("{err}")))?;
        results.push(ReconciliationResult {
            field: record.get(0).unwrap_or_default().to_string(),
            supabase: presence(supabase_col),
            pdf: presence(pdf_col),
            status,
        });
    }
    Ok(results)
}

/// Writes a mapping table (`Database Column,PDF Field,Type,Line,Object`).
pub fn write_mapping_csv<W: Write>(writer: W, table: &MappingTable) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(MAPPING_HEADERS)?;
    for entry in &table.entries {
        let kind = entry.kind.to_string();
        let line = entry.line.to_string();
        csv.write_record([
            entry.source_field.as_str(),
            entry.target_field.as_str(),
            kind.as_str(),
            line.as_str(),
            entry.namespace.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Parses a mapping CSV. `Type`, `Line`, and `Object` are optional columns;
/// missing values default to a text field on the row's own line number.
pub fn read_mapping_csv<R: Read>(reader: R) -> Result<MappingTable> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(source_col), Some(target_col)) =
        (column(MAPPING_HEADERS[0]), column(MAPPING_HEADERS[1]))
    else {
        return Err(DiscoveryError::InvalidCsv(format!(
            "mapping CSV needs '{}' and '{}' columns",
            MAPPING_HEADERS[0], MAPPING_HEADERS[1]
        )));
    };
    let kind_col = column(MAPPING_HEADERS[2]);
    let line_col = column(MAPPING_HEADERS[3]);
    let object_col = column(MAPPING_HEADERS[4]);

    let mut entries = Vec::new();
    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or_default();
        let source_field = cell(Some(source_col)).trim();
        let target_field = cell(Some(target_col)).trim();
        if source_field.is_empty() || target_field.is_empty() {
            continue;
        }
        let kind = match cell(kind_col) {
            "" => fieldmap_core::MappingKind::TextField,
            text => text
                .parse()
                .map_err(|err| DiscoveryError::InvalidCsv(format!("row {}: {err}", index + 2)))?,
        };
        let line = match cell(line_col).trim() {
            "" => index + 2,
            text => text.parse().map_err(|_| {
                DiscoveryError::InvalidCsv(format!("row {}: invalid line '{text}'", index + 2))
            })?,
        };
        entries.push(FieldMapping {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            line,
            kind,
            namespace: cell(object_col).to_string(),
        });
    }
    Ok(MappingTable::from_entries(entries))
}

/// Writes typo findings (`Line,Database Column,PDF Field,Suggested Field,Distance,Confidence`).
pub fn write_typos_csv<W: Write>(writer: W, typos: &[TypoFinding]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "Line",
        "Database Column",
        "PDF Field",
        "Suggested Field",
        "Distance",
        "Confidence",
    ])?;
    for typo in typos {
        let (suggested, distance, confidence) = match &typo.correction {
            Some(fix) => (
                fix.suggested_field.clone(),
                fix.distance.to_string(),
                fix.confidence.to_string(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        csv.write_record([
            typo.line.to_string(),
            typo.source_field.clone(),
            typo.target_field.clone(),
            suggested,
            distance,
            confidence,
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes unmapped columns (`Database Column,Suggested Field,Distance,Confidence`).
pub fn write_unmapped_csv<W: Write>(writer: W, unmapped: &[UnmappedColumn]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Database Column", "Suggested Field", "Distance", "Confidence"])?;
    for column in unmapped {
        let row = match &column.correction {
            Some(fix) => [
                column.column.clone(),
                fix.suggested_field.clone(),
                fix.distance.to_string(),
                fix.confidence.to_string(),
            ],
            None => [column.column.clone(), String::new(), String::new(), String::new()],
        };
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes ad-hoc suggestions (`Wrong Field,Suggested Field,Distance,Confidence`).
///
/// Fields with no candidate in range get empty suggestion cells.
pub fn write_corrections_csv<W: Write>(
    writer: W,
    corrections: &[Correction],
    unmatched: &[String],
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Wrong Field", "Suggested Field", "Distance", "Confidence"])?;
    for fix in corrections {
        csv.write_record([
            fix.wrong_field.clone(),
            fix.suggested_field.clone(),
            fix.distance.to_string(),
            fix.confidence.to_string(),
        ])?;
    }
    for field in unmatched {
        csv.write_record([field.as_str(), "", "", ""])?;
    }
    csv.flush()?;
    Ok(())
}

/// Creates `path` (and its parent directory) and hands the file to `write`.
pub fn write_artifact<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(std::fs::File) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| DiscoveryError::io(parent, err))?;
        }
    }
    let file = std::fs::File::create(path).map_err(|err| DiscoveryError::io(path, err))?;
    write(file)
}
