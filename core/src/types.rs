//! Field type definitions shared by every stage of a reconciliation run.
//!
//! The three namespaces (UI form fields, database columns, PDF form fields)
//! are all represented as plain string identifiers collected into a
//! [`FieldSet`]. Sources that could not be read are represented explicitly
//! through [`SourceFields::Indeterminate`] so that "unknown" is never
//! confused with "empty".

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A field name in one namespace.
///
/// There is no structure to a field name; case and separator conventions
/// (`snake_case` columns vs. hyphenated PDF names) differ per namespace and
/// are a common source of mismatches.
pub type FieldIdentifier = String;

/// Naming namespace a [`FieldSet`] was extracted from.
///
/// # Examples
///
/// ```
/// use fieldmap_core::Namespace;
///
/// assert_eq!(Namespace::Ui.label(), "UI Field");
/// assert_eq!(Namespace::Database.label(), "Database Column");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Field names collected from HTML form markup.
    #[default]
    Ui,
    /// Column names of a database table.
    Database,
    /// Fully-qualified AcroForm field names.
    Pdf,
}

impl Namespace {
    /// Column header used for this namespace in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ui => "UI Field",
            Self::Database => "Database Column",
            Self::Pdf => "PDF Field",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => write!(f, "ui"),
            Self::Database => write!(f, "database"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

/// Insertion-ordered, deduplicated set of field identifiers.
///
/// Iteration yields identifiers in first-seen order. That order is what the
/// fuzzy matcher uses to break ties, so extractors must insert in a stable
/// order (document order, catalog order) for runs to be reproducible.
///
/// # Examples
///
/// ```
/// use fieldmap_core::FieldSet;
///
/// let set: FieldSet = ["email", "full_name", "email"].into_iter().collect();
/// assert_eq!(set.len(), 2);
/// assert!(set.contains("full_name"));
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec!["email", "full_name"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSet {
    order: Vec<FieldIdentifier>,
    members: HashSet<FieldIdentifier>,
}

impl FieldSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identifier, returning `false` when it was already present.
    pub fn insert(&mut self, field: impl Into<FieldIdentifier>) -> bool {
        let field = field.into();
        if self.members.contains(&field) {
            return false;
        }
        self.members.insert(field.clone());
        self.order.push(field);
        true
    }

    /// Returns `true` if the exact (case-sensitive) identifier is present.
    pub fn contains(&self, field: &str) -> bool {
        self.members.contains(field)
    }

    /// Iterates identifiers in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the identifiers sorted alphabetically.
    pub fn sorted(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.iter().collect();
        fields.sort_unstable();
        fields
    }

    /// Returns identifiers of `self` that are not in `other`, in `self` order.
    pub fn difference<'a>(&'a self, other: &'a FieldSet) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |field| !other.contains(field))
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for FieldSet {}

impl<S: Into<FieldIdentifier>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl<S: Into<FieldIdentifier>> Extend<S> for FieldSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for field in iter {
            self.insert(field);
        }
    }
}

impl From<Vec<String>> for FieldSet {
    fn from(fields: Vec<String>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<FieldSet> for Vec<String> {
    fn from(set: FieldSet) -> Self {
        set.order
    }
}

/// Why a source could not produce an authoritative [`FieldSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum IndeterminateReason {
    /// The sample-row fallback returned no rows, so the column set is unknown.
    EmptySample,
    /// The source failed to load or parse.
    ExtractionFailed(String),
}

impl fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySample => write!(
                f,
                "no rows to sample; columns are unknown (add a row or allow catalog access)"
            ),
            Self::ExtractionFailed(message) => write!(f, "extraction failed: {message}"),
        }
    }
}

/// A source whose field names could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indeterminate {
    /// File path or table name the extraction was attempted against.
    pub source: String,
    pub reason: IndeterminateReason,
}

impl Indeterminate {
    pub fn new(source: impl Into<String>, reason: IndeterminateReason) -> Self {
        Self {
            source: source.into(),
            reason,
        }
    }
}

impl fmt::Display for Indeterminate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Result of extracting one source.
///
/// # Examples
///
/// ```
/// use fieldmap_core::{FieldSet, Indeterminate, IndeterminateReason, SourceFields};
///
/// let known = SourceFields::Known(FieldSet::from_iter(["id"]));
/// assert!(known.fields().is_some());
///
/// let unknown = SourceFields::Indeterminate(Indeterminate::new(
///     "users",
///     IndeterminateReason::EmptySample,
/// ));
/// assert!(unknown.fields().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFields {
    Known(FieldSet),
    Indeterminate(Indeterminate),
}

impl SourceFields {
    /// Returns the field set when the source was read successfully.
    pub fn fields(&self) -> Option<&FieldSet> {
        match self {
            Self::Known(set) => Some(set),
            Self::Indeterminate(_) => None,
        }
    }

    /// Returns the indeterminate condition, if any.
    pub fn indeterminate(&self) -> Option<&Indeterminate> {
        match self {
            Self::Known(_) => None,
            Self::Indeterminate(condition) => Some(condition),
        }
    }
}

impl From<FieldSet> for SourceFields {
    fn from(set: FieldSet) -> Self {
        Self::Known(set)
    }
}

/// Kind of PDF call site a mapping was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingKind {
    /// `setFieldText(...)`
    TextField,
    /// `checkField(...)`
    CheckBox,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextField => write!(f, "TextField"),
            Self::CheckBox => write!(f, "CheckBox"),
        }
    }
}

impl std::str::FromStr for MappingKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TextField" | "text" => Ok(Self::TextField),
            "CheckBox" | "checkbox" => Ok(Self::CheckBox),
            other => Err(ParseError::UnknownMappingKind(other.to_string())),
        }
    }
}

/// One observed association between a database column and a PDF field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Database column read at the call site.
    pub source_field: FieldIdentifier,
    /// PDF field written at the call site.
    pub target_field: FieldIdentifier,
    /// 1-based line number of the call site.
    pub line: usize,
    pub kind: MappingKind,
    /// Object the column was read from (e.g. `userData`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Non-fatal issue noticed while building a [`MappingTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MappingWarning {
    /// A single line held more than one recognized call; only the first was kept.
    Ambiguous {
        line: usize,
        kept: FieldIdentifier,
        ignored: Vec<FieldIdentifier>,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambiguous {
                line,
                kept,
                ignored,
            } => write!(
                f,
                "line {line}: multiple field calls on one line; kept '{kept}', ignored {}",
                ignored
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Ordered list of column → PDF field associations.
///
/// # Examples
///
/// ```
/// use fieldmap_core::{FieldMapping, MappingKind, MappingTable};
///
/// let table = MappingTable::from_entries(vec![FieldMapping {
///     source_field: "other_full_name".into(),
///     target_field: "other-full-name".into(),
///     line: 12,
///     kind: MappingKind::TextField,
///     namespace: "incident".into(),
/// }]);
/// assert_eq!(table.targets_for("other_full_name").collect::<Vec<_>>(), vec!["other-full-name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    pub entries: Vec<FieldMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MappingWarning>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<FieldMapping>) -> Self {
        Self {
            entries,
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// PDF fields a column is written to, in source order.
    pub fn targets_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |entry| entry.source_field == source)
            .map(|entry| entry.target_field.as_str())
    }

    /// Returns `true` if the column appears as the source of any mapping.
    pub fn maps_source(&self, source: &str) -> bool {
        self.entries.iter().any(|entry| entry.source_field == source)
    }

    /// Distinct PDF targets in first-seen order.
    pub fn targets(&self) -> FieldSet {
        self.entries
            .iter()
            .map(|entry| entry.target_field.clone())
            .collect()
    }
}

/// Errors parsing the textual forms of core enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown reconciliation status: {0}")]
    UnknownStatus(String),
    #[error("unknown mapping kind: {0}")]
    UnknownMappingKind(String),
    #[error("unknown confidence band: {0}")]
    UnknownConfidence(String),
}
