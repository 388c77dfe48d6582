//! Cross-namespace reconciliation.
//!
//! Every identifier of a primary [`FieldSet`] is checked against an ordered
//! list of downstream stages (the database, then the PDF). A stage may carry a
//! [`MappingTable`] that renames the identifier before the lookup, which is
//! how a `snake_case` column reaches a hyphenated PDF field.
//!
//! # Examples
//!
//! ```
//! use fieldmap_core::*;
//!
//! let ui: FieldSet = ["email", "full_name", "photo_url"].into_iter().collect();
//! let db = SourceFields::Known(["email", "full_name"].into_iter().collect());
//! let pdf = SourceFields::Known(["email"].into_iter().collect());
//!
//! let results = reconcile(
//!     &ui,
//!     &[
//!         Downstream::new(Stage::Supabase, &db),
//!         Downstream::new(Stage::Pdf, &pdf),
//!     ],
//! );
//! assert_eq!(results[0].status, ReconcileStatus::Complete);
//! assert_eq!(results[1].status, ReconcileStatus::MissingPdf);
//! assert_eq!(results[2].status, ReconcileStatus::MissingSupabase);
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{FieldIdentifier, FieldSet, MappingTable, ParseError, SourceFields};

/// A downstream namespace a primary field is expected to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The application database (Supabase in production).
    Supabase,
    /// The PDF form.
    Pdf,
}

impl Stage {
    /// Status reported when a field is absent from this stage.
    pub fn missing_status(self) -> ReconcileStatus {
        match self {
            Self::Supabase => ReconcileStatus::MissingSupabase,
            Self::Pdf => ReconcileStatus::MissingPdf,
        }
    }

    /// Column header used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Supabase => "In Supabase",
            Self::Pdf => "In PDF",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supabase => write!(f, "supabase"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

/// One downstream stage of a reconciliation run.
#[derive(Debug, Clone, Copy)]
pub struct Downstream<'a> {
    pub stage: Stage,
    pub fields: &'a SourceFields,
    /// Renames applied before the lookup (column → PDF field).
    pub mapping: Option<&'a MappingTable>,
}

impl<'a> Downstream<'a> {
    pub fn new(stage: Stage, fields: &'a SourceFields) -> Self {
        Self {
            stage,
            fields,
            mapping: None,
        }
    }

    /// Looks identifiers up through `mapping` before falling back to the
    /// identifier itself.
    pub fn with_mapping(mut self, mapping: &'a MappingTable) -> Self {
        self.mapping = Some(mapping);
        self
    }

    fn presence_of(&self, field: &str) -> Presence {
        let Some(set) = self.fields.fields() else {
            return Presence::Unknown;
        };
        if let Some(mapping) = self.mapping {
            if let Some(target) = mapping.targets_for(field).find(|t| set.contains(t)) {
                return Presence::Mapped(target.to_string());
            }
        }
        if set.contains(field) {
            Presence::Present
        } else {
            Presence::Absent
        }
    }
}

const MAPPED_CELL_PREFIX: &str = "mapped:";

/// Whether a field reached one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum Presence {
    /// Found under the same name.
    Present,
    /// Found under the mapped name.
    Mapped(FieldIdentifier),
    Absent,
    /// The stage's source is indeterminate.
    Unknown,
}

impl Presence {
    /// Cell text used in tabular reports. Mapped names carry a `mapped:`
    /// prefix so that a target called `yes` or `no` reads back unchanged.
    pub fn cell(&self) -> Cow<'_, str> {
        match self {
            Self::Present => Cow::Borrowed("yes"),
            Self::Mapped(target) => Cow::Owned(format!("{MAPPED_CELL_PREFIX}{target}")),
            Self::Absent => Cow::Borrowed("no"),
            Self::Unknown => Cow::Borrowed("unknown"),
        }
    }

    /// Inverse of [`cell`](Self::cell). Unprefixed text other than the three
    /// keywords is also read as a mapped name.
    pub fn from_cell(cell: &str) -> Self {
        if let Some(target) = cell.strip_prefix(MAPPED_CELL_PREFIX) {
            return Self::Mapped(target.to_string());
        }
        match cell {
            "yes" => Self::Present,
            "no" => Self::Absent,
            "unknown" => Self::Unknown,
            other => Self::Mapped(other.to_string()),
        }
    }
}

/// Classification of one primary field.
///
/// Declaration order is report order: missing fields first, complete last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    MissingSupabase,
    MissingPdf,
    Indeterminate,
    Complete,
}

impl ReconcileStatus {
    pub const ALL: [ReconcileStatus; 4] = [
        Self::MissingSupabase,
        Self::MissingPdf,
        Self::Indeterminate,
        Self::Complete,
    ];

    /// Heading used when grouping console output.
    pub fn heading(self) -> &'static str {
        match self {
            Self::MissingSupabase => "Missing from Supabase",
            Self::MissingPdf => "Missing from PDF",
            Self::Indeterminate => "Indeterminate",
            Self::Complete => "Complete",
        }
    }
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSupabase => write!(f, "missing_supabase"),
            Self::MissingPdf => write!(f, "missing_pdf"),
            Self::Indeterminate => write!(f, "indeterminate"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

impl FromStr for ReconcileStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.to_string() == s.trim())
            .ok_or_else(|| ParseError::UnknownStatus(s.to_string()))
    }
}

/// Reconciliation outcome for one primary field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub field: FieldIdentifier,
    /// `None` when the database stage was not part of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase: Option<Presence>,
    /// `None` when the PDF stage was not part of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<Presence>,
    pub status: ReconcileStatus,
}

impl ReconciliationResult {
    /// Presence recorded for `stage`, if the stage took part in the run.
    pub fn presence(&self, stage: Stage) -> Option<&Presence> {
        match stage {
            Stage::Supabase => self.supabase.as_ref(),
            Stage::Pdf => self.pdf.as_ref(),
        }
    }
}

/// Reconciles every field of `primary` against `downstream`, in order.
///
/// The result holds exactly one entry per primary field, in the primary
/// set's iteration order. Use [`sort_for_report`] before rendering.
pub fn reconcile(primary: &FieldSet, downstream: &[Downstream<'_>]) -> Vec<ReconciliationResult> {
    primary
        .iter()
        .map(|field| reconcile_field(field, downstream))
        .collect()
}

fn reconcile_field(field: &str, downstream: &[Downstream<'_>]) -> ReconciliationResult {
    let mut result = ReconciliationResult {
        field: field.to_string(),
        supabase: None,
        pdf: None,
        status: ReconcileStatus::Complete,
    };
    let mut first_missing = None;
    let mut saw_unknown = false;

    for stage in downstream {
        let presence = stage.presence_of(field);
        match presence {
            Presence::Absent if first_missing.is_none() => {
                first_missing = Some(stage.stage.missing_status());
            }
            Presence::Unknown => saw_unknown = true,
            _ => {}
        }
        match stage.stage {
            Stage::Supabase => result.supabase = Some(presence),
            Stage::Pdf => result.pdf = Some(presence),
        }
    }

    result.status = match (first_missing, saw_unknown) {
        (Some(missing), _) => missing,
        (None, true) => ReconcileStatus::Indeterminate,
        (None, false) => ReconcileStatus::Complete,
    };
    result
}

/// Orders results for rendering: by status (missing first), then by field.
///
/// Report diffs between runs depend on this order.
pub fn sort_for_report(results: &mut [ReconciliationResult]) {
    results.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.field.cmp(&b.field)));
}

/// Number of results per status, in report order.
pub fn summarize(results: &[ReconciliationResult]) -> BTreeMap<ReconcileStatus, usize> {
    let mut counts: BTreeMap<ReconcileStatus, usize> =
        ReconcileStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for result in results {
        *counts.entry(result.status).or_default() += 1;
    }
    counts
}
