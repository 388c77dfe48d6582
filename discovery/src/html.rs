//! UI field extraction from HTML form markup.
//!
//! Markup is scanned as text, one line at a time; it is never parsed into a
//! DOM. Any `<input>`, `<select>`, or `<textarea>` opener whose `name`
//! attribute sits on the same line contributes its value. Attribute order and
//! quoting style do not matter, and a `>` inside a quoted value does not end
//! the tag. A tag whose `name=` is on a later line than
//! the tag opener is missed; that false negative is accepted.

use std::path::Path;
use std::sync::LazyLock;

use fieldmap_core::FieldSet;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, read_text};

static FORM_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:input|select|textarea)\b((?:"[^"]*"|'[^']*'|[^'">])*)"#)
        .expect("static regex must compile")
});

/// One attribute: its name, then an optional double-quoted, single-quoted or
/// bare value. Quoted values are consumed whole.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'=<>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+)))?"#)
        .expect("static regex must compile")
});

/// Extracts form field names from HTML text, in document order.
///
/// # Examples
///
/// ```
/// use fieldmap_discovery::html::extract_html_fields;
///
/// let html = r#"
///   <input type="email" name="email" required>
///   <SELECT class='x' name='vehicle_make'></SELECT>
///   <textarea name=notes rows=4></textarea>
///   <input type="submit" value="Go">
/// "#;
/// let fields = extract_html_fields(html);
/// assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["email", "vehicle_make", "notes"]);
/// ```
pub fn extract_html_fields(markup: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    for line in markup.lines() {
        for tag in FORM_TAG_RE.captures_iter(line) {
            let attributes = tag.get(1).map_or("", |m| m.as_str());
            if let Some(value) = name_attribute(attributes) {
                fields.insert(value);
            }
        }
    }
    fields
}

/// Value of the first `name` attribute, trimmed; `None` when absent or blank.
fn name_attribute(attributes: &str) -> Option<&str> {
    let attr = ATTR_RE
        .captures_iter(attributes)
        .find(|attr| attr[1].eq_ignore_ascii_case("name"))?;
    let value = attr
        .get(2)
        .or_else(|| attr.get(3))
        .or_else(|| attr.get(4))
        .map_or("", |m| m.as_str())
        .trim();
    (!value.is_empty()).then_some(value)
}

/// Reads and extracts one HTML file.
pub fn extract_html_file(path: impl AsRef<Path>) -> Result<FieldSet> {
    let path = path.as_ref();
    let markup = read_text(path)?;
    let fields = extract_html_fields(&markup);
    debug!(path = %path.display(), count = fields.len(), "extracted HTML form fields");
    Ok(fields)
}

/// Extracts several pages of a multi-step form into one set, in argument order.
///
/// Fails on the first unreadable file.
pub fn extract_html_files<P: AsRef<Path>>(paths: &[P]) -> Result<FieldSet> {
    let mut fields = FieldSet::new();
    for path in paths {
        fields.extend(extract_html_file(path)?.iter().map(str::to_string));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(markup: &str) -> Vec<String> {
        extract_html_fields(markup)
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_attribute_order_and_quoting() {
        let markup = concat!(
            r#"<input name="a" type="text">"#,
            "\n",
            r#"<input type='text' name='b'>"#,
            "\n",
            r#"<input id=c name=c>"#,
            "\n",
            r#"<input type="text" NAME = "d" />"#,
        );
        assert_eq!(names(markup), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_ignores_non_form_tags_and_data_attributes() {
        let markup = r#"
            <meta name="viewport" content="width=device-width">
            <div data-name="not_a_field"></div>
            <input data-name="also_not" name="real_field">
            <form name="signup">
        "#;
        assert_eq!(names(markup), vec!["real_field"]);
    }

    #[test]
    fn test_angle_bracket_inside_quoted_attribute() {
        let markup = concat!(
            r#"<input type="text" oninput="if (this.value.length > 8) check()" name="postcode">"#,
            "\n",
            r#"<input pattern='[^>]+' data-x="name=decoy" name=town>"#,
        );
        assert_eq!(names(markup), vec!["postcode", "town"]);
    }

    #[test]
    fn test_multiple_tags_on_one_line() {
        let markup = r#"<input name="first"><input name="second"><select name="third">"#;
        assert_eq!(names(markup), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_name_on_following_line_is_not_matched() {
        let markup = "<input type=\"text\"\n       name=\"split_field\">\n<input name=\"kept\">";
        assert_eq!(names(markup), vec!["kept"]);
    }

    #[test]
    fn test_duplicates_and_empty_names_are_dropped() {
        let markup = r#"
            <input type="radio" name="injured" value="yes">
            <input type="radio" name="injured" value="no">
            <input name="">
        "#;
        assert_eq!(names(markup), vec!["injured"]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let markup = r#"<input name="z"><input name="a"><textarea name="m"></textarea>"#;
        assert_eq!(extract_html_fields(markup), extract_html_fields(markup));
    }

    #[test]
    fn test_extract_html_files_unions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let page1 = dir.path().join("step1.html");
        let page2 = dir.path().join("step2.html");
        std::fs::write(&page1, r#"<input name="email"><input name="full_name">"#).unwrap();
        std::fs::write(&page2, r#"<input name="full_name"><input name="photo_url">"#).unwrap();

        let fields = extract_html_files(&[&page1, &page2]).unwrap();
        assert_eq!(
            fields.iter().collect::<Vec<_>>(),
            vec!["email", "full_name", "photo_url"]
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = extract_html_file("/nonexistent/signup.html").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/signup.html"));
    }
}
