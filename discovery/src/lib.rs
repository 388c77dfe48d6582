//! Field extraction and report rendering.
//!
//! This crate reads the sources that name fields in each namespace and turns
//! reconciliation results into artifacts:
//!
//! - [`html`]: UI field names from `<input>`, `<select>`, and `<textarea>` tags.
//! - [`pdf`]: fully-qualified AcroForm field names from a PDF template.
//! - [`mapping`]: the database-column to PDF-field table scraped from
//!   PDF-filling code.
//! - [`report`], [`artifact`], [`output`]: structured reports, CSV artifacts,
//!   and console rendering.
//!
//! Database columns live in the `fieldmap-sqlite` crate.
//!
//! # Example
//!
//! ```
//! use fieldmap_core::{Downstream, Namespace, ReconcileStatus, SourceFields, Stage, reconcile};
//! use fieldmap_discovery::html::extract_html_fields;
//! use fieldmap_discovery::report::ReconciliationReport;
//!
//! let ui = extract_html_fields(r#"<input name="email"><input name="phone">"#);
//! let columns = SourceFields::Known(["email"].into_iter().collect());
//! let results = reconcile(&ui, &[Downstream::new(Stage::Supabase, &columns)]);
//!
//! let report =
//!     ReconciliationReport::new(Namespace::Ui, "signup.html", vec![Stage::Supabase], results);
//! assert_eq!(report.results[0].field, "phone");
//! assert_eq!(report.results[0].status, ReconcileStatus::MissingSupabase);
//! ```

pub mod artifact;
pub mod error;
pub mod html;
pub mod mapping;
pub mod output;
pub mod pdf;
pub mod report;

pub use error::{DiscoveryError, Result};
