//! Mapping-table audits.
//!
//! Two checks that complement [`reconcile`](crate::reconcile):
//! PDF targets referenced by the mapping that do not exist in the PDF form
//! (usually typos), and database columns that no mapping ever writes.

use serde::{Deserialize, Serialize};

use crate::fuzzy::{Correction, suggest};
use crate::types::{FieldIdentifier, FieldSet, MappingKind, MappingTable};

/// A mapping whose PDF target is not a field of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypoFinding {
    pub source_field: FieldIdentifier,
    pub target_field: FieldIdentifier,
    pub line: usize,
    pub kind: MappingKind,
    /// Closest PDF field, if one is within the distance threshold.
    pub correction: Option<Correction>,
}

/// A database column that no mapping writes into the PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedColumn {
    pub column: FieldIdentifier,
    /// Closest PDF field, when PDF fields were supplied.
    pub correction: Option<Correction>,
}

/// Finds mapping entries that point at PDF fields the form does not have.
///
/// Findings follow mapping order; one finding per offending entry, so a typo
/// repeated on several lines is reported on each of them.
///
/// # Examples
///
/// ```
/// use fieldmap_core::*;
///
/// let mapping = MappingTable::from_entries(vec![FieldMapping {
///     source_field: "driver_name".into(),
///     target_field: "driver_nmae".into(),
///     line: 8,
///     kind: MappingKind::TextField,
///     namespace: "user".into(),
/// }]);
/// let pdf: FieldSet = ["driver_name"].into_iter().collect();
///
/// let typos = find_target_typos(&mapping, &pdf, DEFAULT_MAX_DISTANCE);
/// assert_eq!(typos.len(), 1);
/// assert_eq!(typos[0].correction.as_ref().unwrap().suggested_field, "driver_name");
/// ```
pub fn find_target_typos(
    mapping: &MappingTable,
    pdf_fields: &FieldSet,
    max_distance: usize,
) -> Vec<TypoFinding> {
    mapping
        .entries
        .iter()
        .filter(|entry| !pdf_fields.contains(&entry.target_field))
        .map(|entry| TypoFinding {
            source_field: entry.source_field.clone(),
            target_field: entry.target_field.clone(),
            line: entry.line,
            kind: entry.kind,
            correction: suggest(&entry.target_field, pdf_fields, max_distance),
        })
        .collect()
}

/// Finds columns that never appear as a mapping source.
///
/// When `pdf_fields` is given, each unmapped column also gets the closest PDF
/// field that is not already a mapping target.
pub fn find_unmapped_columns(
    columns: &FieldSet,
    mapping: &MappingTable,
    pdf_fields: Option<&FieldSet>,
    max_distance: usize,
) -> Vec<UnmappedColumn> {
    let used_targets = mapping.targets();
    let free_targets: Option<FieldSet> = pdf_fields.map(|pdf| {
        pdf.difference(&used_targets)
            .map(str::to_string)
            .collect()
    });

    columns
        .iter()
        .filter(|column| !mapping.maps_source(column))
        .map(|column| UnmappedColumn {
            column: column.to_string(),
            correction: free_targets
                .as_ref()
                .and_then(|targets| suggest(column, targets, max_distance)),
        })
        .collect()
}
