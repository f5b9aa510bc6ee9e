//! Graph-safe identifiers for labels and relationship types.
//!
//! Both functions are total and idempotent. Distinct inputs may collapse to the
//! same identifier (`"Drug/Ingredient"` and `"Drug Ingredient"` both become
//! `DrugIngredient`); no collision resolution is attempted.

use once_cell::sync::Lazy;
use regex::Regex;

static ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").expect("alphanumeric pattern is valid"));

static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("separator pattern is valid"));

/// Convert arbitrary text into an UpperCamelCase node label.
///
/// Maximal alphanumeric runs are kept, everything else is dropped, and the
/// first character of each run is uppercased. The remainder of a run is left
/// as-is so that already-canonical labels pass through unchanged.
///
/// ```
/// use vocabgraph_core::standardize_label;
///
/// assert_eq!(standardize_label("Drug/Ingredient"), "DrugIngredient");
/// assert_eq!(standardize_label("spec_anatomic_site"), "SpecAnatomicSite");
/// assert_eq!(standardize_label(""), "");
/// ```
pub fn standardize_label(s: &str) -> String {
    let mut label = String::with_capacity(s.len());
    for run in ALNUM_RUN.find_iter(s) {
        let mut chars = run.as_str().chars();
        if let Some(first) = chars.next() {
            label.push(first.to_ascii_uppercase());
            label.push_str(chars.as_str());
        }
    }
    label
}

/// Convert arbitrary text into an UPPER_SNAKE_CASE relationship type.
///
/// ```
/// use vocabgraph_core::standardize_reltype;
///
/// assert_eq!(standardize_reltype("maps to"), "MAPS_TO");
/// assert_eq!(standardize_reltype("ATC - ATC"), "ATC_ATC");
/// assert_eq!(standardize_reltype("_leading_sep"), "LEADING_SEP");
/// ```
pub fn standardize_reltype(s: &str) -> String {
    let joined = SEPARATOR_RUN.replace_all(s, "_");
    joined.trim_matches('_').to_ascii_uppercase()
}
