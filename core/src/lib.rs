//! Core types and algorithms for cross-namespace field reconciliation.
//!
//! A car-accident reporting form travels through three naming namespaces:
//! UI form fields, database columns, and PDF form fields. This crate models
//! them and compares them:
//!
//! - [`FieldSet`]: ordered, deduplicated identifiers from one source.
//! - [`SourceFields`]: a field set, or an explicit [`Indeterminate`]
//!   condition when the source could not be read.
//! - [`MappingTable`]: column → PDF field associations scraped from code.
//! - [`reconcile`]: classifies each primary field as complete or missing
//!   from the first downstream stage that lacks it.
//! - [`levenshtein`] / [`suggest`]: correction suggestions for fields that
//!   failed exact matching.
//! - [`find_target_typos`] / [`find_unmapped_columns`]: mapping audits.
//!
//! # Example
//!
//! ```
//! use fieldmap_core::*;
//!
//! let ui: FieldSet = ["email", "other_full_name"].into_iter().collect();
//! let db = SourceFields::Known(["email", "other_full_name"].into_iter().collect());
//! let pdf = SourceFields::Known(["email", "other-full-name"].into_iter().collect());
//! let mapping = MappingTable::from_entries(vec![FieldMapping {
//!     source_field: "other_full_name".into(),
//!     target_field: "other-full-name".into(),
//!     line: 1,
//!     kind: MappingKind::TextField,
//!     namespace: "incident".into(),
//! }]);
//!
//! let mut results = reconcile(
//!     &ui,
//!     &[
//!         Downstream::new(Stage::Supabase, &db),
//!         Downstream::new(Stage::Pdf, &pdf).with_mapping(&mapping),
//!     ],
//! );
//! sort_for_report(&mut results);
//! assert!(results.iter().all(|r| r.status == ReconcileStatus::Complete));
//! ```

mod audit;
mod fuzzy;
mod reconcile;
mod types;

pub use audit::{TypoFinding, UnmappedColumn, find_target_typos, find_unmapped_columns};
pub use fuzzy::{
    ConfidenceBand, Correction, DEFAULT_MAX_DISTANCE, levenshtein, suggest, suggest_all,
};
pub use reconcile::{
    Downstream, Presence, ReconcileStatus, ReconciliationResult, Stage, reconcile,
    sort_for_report, summarize,
};
pub use types::*;
