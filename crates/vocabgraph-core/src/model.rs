//! Graph data model: labels, relationship types and derived concept fields.

use crate::sanitize::standardize_label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base label carried by every concept node.
pub const CONCEPT_LABEL: &str = "Concept";

/// Label of domain reference nodes.
pub const DOMAIN_LABEL: &str = "Domain";

/// Label of vocabulary reference nodes.
pub const VOCABULARY_LABEL: &str = "Vocabulary";

/// Marker label for standard concepts.
pub const STANDARD_LABEL: &str = "Standard";

/// `standard_concept` value that marks a standard concept.
pub const STANDARD_MARKER: &str = "S";

/// Concept → Domain.
pub const IN_DOMAIN: &str = "IN_DOMAIN";

/// Concept → Vocabulary.
pub const FROM_VOCABULARY: &str = "FROM_VOCABULARY";

/// Descendant → ancestor closure edge.
pub const HAS_ANCESTOR: &str = "HAS_ANCESTOR";

/// Separator for list-valued fields (labels and synonyms).
pub const ARRAY_DELIMITER: char = '|';

/// Ordered, duplicate-free set of node labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label, ignoring empties and duplicates.
    pub fn push(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !label.is_empty() && !self.0.contains(&label) {
            self.0.push(label);
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialized form used in the `:LABEL` column.
    pub fn to_field(&self) -> String {
        self.0.join(&ARRAY_DELIMITER.to_string())
    }

    /// Parse a `:LABEL` column value.
    pub fn from_field(field: &str) -> Self {
        let mut set = Self::new();
        for label in field.split(ARRAY_DELIMITER) {
            set.push(label);
        }
        set
    }

    /// Canonical key for grouping: labels sorted and joined with `:`.
    pub fn group_key(&self) -> String {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();
        sorted.join(":")
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_field())
    }
}

impl FromIterator<String> for LabelSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for label in iter {
            set.push(label);
        }
        set
    }
}

/// Labels of a concept node, derived from its domain and standard flag only.
///
/// Order: `Concept`, the sanitized domain (omitted when it sanitizes to
/// nothing), then `Standard` iff the flag equals [`STANDARD_MARKER`].
pub fn concept_labels(domain_id: &str, standard_concept: &str) -> LabelSet {
    let mut labels = LabelSet::new();
    labels.push(CONCEPT_LABEL);
    labels.push(standardize_label(domain_id));
    if standard_concept == STANDARD_MARKER {
        labels.push(STANDARD_LABEL);
    }
    labels
}

/// Split a packed synonym field. Order is preserved and duplicates are kept.
pub fn parse_synonyms(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(ARRAY_DELIMITER).map(str::to_string).collect()
}
