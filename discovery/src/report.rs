//! Structured reconciliation reports.

use std::collections::BTreeMap;

use chrono::Utc;
use fieldmap_core::{
    Indeterminate, MappingWarning, Namespace, ReconcileStatus, ReconciliationResult, Stage,
    sort_for_report, summarize,
};
use serde::{Deserialize, Serialize};

/// Everything rendered by one reconciliation run.
///
/// Results are sorted on construction with
/// [`sort_for_report`](fieldmap_core::sort_for_report), so every renderer
/// emits the same deterministic order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    /// Namespace of the primary field set.
    pub primary: Namespace,
    /// Path or table name the primary fields came from.
    pub primary_source: String,
    /// Downstream stages checked, in order.
    pub stages: Vec<Stage>,
    pub summary: BTreeMap<ReconcileStatus, usize>,
    /// Downstream sources that could not be read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indeterminate: Vec<Indeterminate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapping_warnings: Vec<MappingWarning>,
    pub results: Vec<ReconciliationResult>,
}

impl ReconciliationReport {
    pub fn new(
        primary: Namespace,
        primary_source: impl Into<String>,
        stages: Vec<Stage>,
        mut results: Vec<ReconciliationResult>,
    ) -> Self {
        sort_for_report(&mut results);
        Self {
            generated_at: Utc::now().to_rfc3339(),
            primary,
            primary_source: primary_source.into(),
            stages,
            summary: summarize(&results),
            indeterminate: Vec::new(),
            mapping_warnings: Vec::new(),
            results,
        }
    }

    /// Records downstream sources that were indeterminate during the run.
    pub fn with_indeterminate(mut self, sources: Vec<Indeterminate>) -> Self {
        self.indeterminate = sources;
        self
    }

    pub fn with_mapping_warnings(mut self, warnings: Vec<MappingWarning>) -> Self {
        self.mapping_warnings = warnings;
        self
    }

    /// Results with the given status, in report order.
    pub fn with_status(
        &self,
        status: ReconcileStatus,
    ) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    /// Number of fields that are not [`Complete`](ReconcileStatus::Complete).
    pub fn incomplete_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status != ReconcileStatus::Complete)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_core::{Downstream, FieldSet, IndeterminateReason, SourceFields, reconcile};

    #[test]
    fn test_report_sorts_and_summarizes() {
        let ui: FieldSet = ["zeta", "alpha", "beta"].into_iter().collect();
        let db = SourceFields::Known(["zeta", "alpha"].into_iter().collect());
        let results = reconcile(&ui, &[Downstream::new(Stage::Supabase, &db)]);

        let report =
            ReconciliationReport::new(Namespace::Ui, "form.html", vec![Stage::Supabase], results);
        let order: Vec<&str> = report.results.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(order, vec!["beta", "alpha", "zeta"]);
        assert_eq!(report.summary[&ReconcileStatus::Complete], 2);
        assert_eq!(report.incomplete_count(), 1);
        assert_eq!(report.with_status(ReconcileStatus::MissingSupabase).count(), 1);
    }

    #[test]
    fn test_report_json_keeps_indeterminate_sources() {
        let report = ReconciliationReport::new(
            Namespace::Ui,
            "form.html",
            vec![Stage::Supabase],
            Vec::new(),
        )
        .with_indeterminate(vec![Indeterminate::new(
            "user_signup",
            IndeterminateReason::EmptySample,
        )]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["indeterminate"][0]["source"], "user_signup");
        assert_eq!(json["indeterminate"][0]["reason"]["kind"], "empty_sample");
        assert_eq!(json["summary"]["complete"], 0);
        assert!(json.get("mapping_warnings").is_none());
    }
}
