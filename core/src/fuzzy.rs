//! Levenshtein-based correction suggestions.
//!
//! Distances are computed case-insensitively on Unicode scalar values with
//! unit costs for insertion, deletion, and substitution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{FieldIdentifier, FieldSet, ParseError};

/// Largest distance a suggestion may have unless the caller overrides it.
pub const DEFAULT_MAX_DISTANCE: usize = 5;

/// Coarse confidence derived from an edit distance.
///
/// # Examples
///
/// ```
/// use fieldmap_core::ConfidenceBand;
///
/// assert_eq!(ConfidenceBand::from_distance(2), ConfidenceBand::High);
/// assert_eq!(ConfidenceBand::from_distance(3), ConfidenceBand::Medium);
/// assert_eq!(ConfidenceBand::from_distance(5), ConfidenceBand::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// Distance 0–2.
    High,
    /// Distance 3–4.
    Medium,
    /// Distance 5 and above.
    Low,
}

impl ConfidenceBand {
    pub fn from_distance(distance: usize) -> Self {
        match distance {
            0..=2 => Self::High,
            3..=4 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl FromStr for ConfidenceBand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ParseError::UnknownConfidence(other.to_string())),
        }
    }
}

/// Proposed replacement for a field name that failed exact matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub wrong_field: FieldIdentifier,
    pub suggested_field: FieldIdentifier,
    /// Minimum distance from `wrong_field` to any candidate.
    pub distance: usize,
    pub confidence: ConfidenceBand,
}

/// Case-insensitive Levenshtein distance.
///
/// # Examples
///
/// ```
/// use fieldmap_core::levenshtein;
///
/// assert_eq!(levenshtein("kitten", "sitting"), 3);
/// assert_eq!(levenshtein("Email", "email"), 0);
/// assert_eq!(levenshtein("", "abc"), 3);
/// ```
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows of the (len(a)+1) x (len(b)+1) table.
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Suggests the closest candidate for `wrong_field`.
///
/// Returns `None` when `candidates` is empty or the smallest distance exceeds
/// `max_distance`. Ties go to the candidate seen first in `candidates`.
///
/// # Examples
///
/// ```
/// use fieldmap_core::{suggest, FieldSet, ConfidenceBand};
///
/// let pdf: FieldSet = ["driver_name", "driver_email"].into_iter().collect();
/// let fix = suggest("driver_nmae", &pdf, 5).unwrap();
/// assert_eq!(fix.suggested_field, "driver_name");
/// assert_eq!(fix.confidence, ConfidenceBand::High);
///
/// assert!(suggest("completely_unrelated_field_name", &pdf, 2).is_none());
/// ```
pub fn suggest(
    wrong_field: &str,
    candidates: &FieldSet,
    max_distance: usize,
) -> Option<Correction> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates.iter() {
        let distance = levenshtein(wrong_field, candidate);
        if best.is_none_or(|(_, current)| distance < current) {
            best = Some((candidate, distance));
            if distance == 0 {
                break;
            }
        }
    }

    let (suggested, distance) = best?;
    if distance > max_distance {
        return None;
    }
    Some(Correction {
        wrong_field: wrong_field.to_string(),
        suggested_field: suggested.to_string(),
        distance,
        confidence: ConfidenceBand::from_distance(distance),
    })
}

/// Runs [`suggest`] for every wrong field.
///
/// Returns the corrections found and, separately, the fields for which no
/// candidate was within `max_distance`. Both keep the input order.
pub fn suggest_all<'a, I>(
    wrong_fields: I,
    candidates: &FieldSet,
    max_distance: usize,
) -> (Vec<Correction>, Vec<FieldIdentifier>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut corrections = Vec::new();
    let mut unmatched = Vec::new();
    for wrong in wrong_fields {
        match suggest(wrong, candidates, max_distance) {
            Some(correction) => corrections.push(correction),
            None => unmatched.push(wrong.to_string()),
        }
    }
    (corrections, unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(fields: &[&str]) -> FieldSet {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_identity_distance_is_zero() {
        for word in ["", "a", "other_full_name", "Straße"] {
            assert_eq!(levenshtein(word, word), 0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            ("other-full-name", "other_full_name"),
            ("kitten", "sitting"),
            ("vehicle_reg", "vehicle_registration"),
            ("", "abc"),
            ("flaw", "lawn"),
        ];
        for (a, b) in pairs {
            assert_eq!(levenshtein(a, b), levenshtein(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_hyphen_to_underscore_fixture() {
        // Two separators, two substitutions.
        assert_eq!(levenshtein("other-full-name", "other_full_name"), 2);
        assert_eq!(
            levenshtein("other-driver-full-name", "other_driver_full_name"),
            3
        );
    }

    #[test]
    fn test_distance_ignores_case() {
        assert_eq!(levenshtein("DRIVER_NAME", "driver_name"), 0);
        assert_eq!(levenshtein("Driver-Name", "driver_name"), 1);
    }

    #[test]
    fn test_suggest_respects_threshold() {
        let candidates = set(&["alpha", "beta"]);
        assert_eq!(suggest("completely_unrelated_field_name", &candidates, 5), None);
    }

    #[test]
    fn test_suggest_empty_candidates() {
        assert_eq!(suggest("email", &FieldSet::new(), 5), None);
    }

    #[test]
    fn test_suggest_tie_goes_to_first_candidate() {
        // "cat" is one edit from both "bat" and "cut".
        let first = suggest("cat", &set(&["bat", "cut"]), 5).unwrap();
        assert_eq!(first.suggested_field, "bat");
        let reversed = suggest("cat", &set(&["cut", "bat"]), 5).unwrap();
        assert_eq!(reversed.suggested_field, "cut");
    }

    #[test]
    fn test_suggest_reports_minimum_distance_and_band() {
        let candidates = set(&["witness_name", "witness_phone", "other_full_name"]);
        let fix = suggest("other-full-name", &candidates, 5).unwrap();
        assert_eq!(fix.suggested_field, "other_full_name");
        assert_eq!(fix.distance, 2);
        assert_eq!(fix.confidence, ConfidenceBand::High);

        let fix = suggest("witnes_phon", &candidates, 5).unwrap();
        assert_eq!(fix.suggested_field, "witness_phone");
        assert_eq!(fix.distance, 2);
    }

    #[test]
    fn test_suggest_allows_distance_equal_to_threshold() {
        let candidates = set(&["abcdefgh"]);
        let fix = suggest("abc", &candidates, 5).unwrap();
        assert_eq!(fix.distance, 5);
        assert_eq!(fix.confidence, ConfidenceBand::Low);
        assert!(suggest("abc", &candidates, 4).is_none());
    }

    #[test]
    fn test_suggest_all_splits_matched_and_unmatched() {
        let candidates = set(&["email", "full_name"]);
        let (fixes, unmatched) = suggest_all(
            ["emial", "zzzzzzzzzzzzzzzz", "full-name"],
            &candidates,
            DEFAULT_MAX_DISTANCE,
        );
        assert_eq!(
            fixes
                .iter()
                .map(|c| c.suggested_field.as_str())
                .collect::<Vec<_>>(),
            vec!["email", "full_name"]
        );
        assert_eq!(unmatched, vec!["zzzzzzzzzzzzzzzz".to_string()]);
    }

    #[test]
    fn test_confidence_band_boundaries() {
        let expected = [
            (0, ConfidenceBand::High),
            (2, ConfidenceBand::High),
            (3, ConfidenceBand::Medium),
            (4, ConfidenceBand::Medium),
            (5, ConfidenceBand::Low),
            (12, ConfidenceBand::Low),
        ];
        for (distance, band) in expected {
            assert_eq!(ConfidenceBand::from_distance(distance), band);
            assert_eq!(band.to_string().parse::<ConfidenceBand>().unwrap(), band);
        }
    }
}
