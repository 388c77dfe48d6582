//! Mapping-table builder.
//!
//! Scrapes PDF-filling code for the two call shapes that copy a database
//! column into a PDF field:
//!
//! ```text
//! setFieldText('driver-name', userData.driver_name);
//! checkField('injured_yes', incidentData?.injured);
//! ```
//!
//! Matching is line-oriented. A call split across lines is not captured, and
//! when one line holds several calls only the first is kept; the rest are
//! reported as [`MappingWarning::Ambiguous`].

use std::path::Path;
use std::sync::LazyLock;

use fieldmap_core::{FieldMapping, MappingKind, MappingTable, MappingWarning};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, read_text};

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"\b(setFieldText|checkField)\s*\(\s*"#,
        r#"(?:'([^']+)'|"([^"]+)"|`([^`$]+)`)\s*,\s*"#,
        r#"([A-Za-z_$][\w$]*)\s*(?:\?\.|\.)\s*([A-Za-z_$][\w$]*)"#,
    ))
    .expect("static regex must compile")
});

/// Builds a mapping table from source text.
///
/// Commented-out lines (`//` or block-comment continuation `*`) are skipped.
///
/// # Examples
///
/// ```
/// use fieldmap_core::MappingKind;
/// use fieldmap_discovery::mapping::build_mapping_table;
///
/// let code = "\
/// setFieldText('other-full-name', incidentData.other_full_name || '');
/// checkField('airbags_deployed', incidentData.airbags_deployed === 'yes');
/// ";
/// let table = build_mapping_table(code);
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.entries[0].source_field, "other_full_name");
/// assert_eq!(table.entries[0].target_field, "other-full-name");
/// assert_eq!(table.entries[1].kind, MappingKind::CheckBox);
/// assert_eq!(table.entries[1].line, 2);
/// ```
pub fn build_mapping_table(source: &str) -> MappingTable {
    let mut table = MappingTable::new();

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('*') {
            continue;
        }

        let mut calls = CALL_RE.captures_iter(line).map(|caps| {
            let kind = match &caps[1] {
                "checkField" => MappingKind::CheckBox,
                _ => MappingKind::TextField,
            };
            let target = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            FieldMapping {
                source_field: caps[6].to_string(),
                target_field: target.to_string(),
                line: line_number,
                kind,
                namespace: caps[5].to_string(),
            }
        });

        let Some(first) = calls.next() else {
            continue;
        };
        let ignored: Vec<String> = calls.map(|extra| extra.target_field).collect();
        if !ignored.is_empty() {
            warn!(
                line = line_number,
                kept = %first.target_field,
                ignored = ?ignored,
                "multiple field calls on one line; keeping the first"
            );
            table.warnings.push(MappingWarning::Ambiguous {
                line: line_number,
                kept: first.target_field.clone(),
                ignored,
            });
        }
        table.entries.push(first);
    }

    debug!(
        mappings = table.len(),
        warnings = table.warnings.len(),
        "built mapping table"
    );
    table
}

/// Reads a source file and builds its mapping table.
pub fn build_mapping_file(path: impl AsRef<Path>) -> Result<MappingTable> {
    let path = path.as_ref();
    let source = read_text(path)?;
    Ok(build_mapping_table(&source))
}

/// Loads a mapping from either a previously exported CSV or source code.
///
/// Files ending in `.csv` are read with
/// [`read_mapping_csv`](crate::artifact::read_mapping_csv); anything else is
/// scanned with [`build_mapping_table`].
pub fn load_mapping(path: impl AsRef<Path>) -> Result<MappingTable> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        let file = std::fs::File::open(path)
            .map_err(|err| crate::error::DiscoveryError::io(path, err))?;
        crate::artifact::read_mapping_csv(file)
    } else {
        build_mapping_file(path)
    }
}
