//! Reconciling an HTML page against a mapping and a list of PDF fields.
//!
//! Runs entirely on in-memory text, so no PDF template or database is
//! needed.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p fieldmap-discovery --example reconcile_page
//! ```

use fieldmap_core::{Downstream, FieldSet, Namespace, SourceFields, Stage, reconcile};
use fieldmap_discovery::html::extract_html_fields;
use fieldmap_discovery::mapping::build_mapping_table;
use fieldmap_discovery::output::{OutputFormat, format_reconciliation};
use fieldmap_discovery::report::ReconciliationReport;

fn main() {
    let page = r#"
<form>
  <input type="text" name="other_full_name">
  <input type="text" name="other_vehicle_reg">
  <input type="checkbox" name="airbags_deployed">
  <textarea name="accident_description"></textarea>
</form>
"#;

    let filler = "
setFieldText('other-full-name', incidentData.other_full_name);
setFieldText('other_registration', incidentData.other_vehicle_reg);
checkField('airbags_deployed', incidentData.airbags_deployed === 'yes');
";

    let pdf_fields: FieldSet = [
        "other-full-name",
        "other_registration",
        "airbags_deployed",
        "witness_name",
    ]
    .into_iter()
    .collect();

    let ui = extract_html_fields(page);
    let mapping = build_mapping_table(filler);
    let pdf = SourceFields::Known(pdf_fields);

    let results = reconcile(
        &ui,
        &[Downstream::new(Stage::Pdf, &pdf).with_mapping(&mapping)],
    );
    let report =
        ReconciliationReport::new(Namespace::Ui, "incident.html", vec![Stage::Pdf], results)
            .with_mapping_warnings(mapping.warnings.clone());

    match format_reconciliation(&report, OutputFormat::Table) {
        Ok(text) => print!("{text}"),
        Err(err) => eprintln!("error: {err}"),
    }
}
