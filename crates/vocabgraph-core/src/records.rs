//! Layout of the graph record files shared by the online and bulk paths.
//!
//! Column names follow the bulk importer's `name:type` convention so the same
//! files serve both loading strategies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date layout of every `:date` column.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Extract file with one row per domain.
pub const DOMAIN_EXTRACT: &str = "domain.csv";
/// Extract file with one row per vocabulary.
pub const VOCABULARY_EXTRACT: &str = "vocabulary.csv";
/// Extract file with one row per concept, synonyms already aggregated.
pub const CONCEPT_EXTRACT: &str = "concepts_optimized.csv";
/// Extract file with one row per semantic relationship.
pub const RELATIONSHIP_EXTRACT: &str = "concept_relationship.csv";
/// Extract file with one row per ancestor closure pair.
pub const ANCESTOR_EXTRACT: &str = "concept_ancestor.csv";

pub const DOMAIN_NODE_HEADER: &[&str] = &[
    "domain_id:ID(Domain-ID)",
    ":LABEL",
    "domain_name:string",
    "domain_concept_id:long",
];

pub const VOCABULARY_NODE_HEADER: &[&str] = &[
    "vocabulary_id:ID(Vocabulary-ID)",
    ":LABEL",
    "vocabulary_name:string",
    "vocabulary_reference:string",
    "vocabulary_version:string",
    "vocabulary_concept_id:long",
];

pub const CONCEPT_NODE_HEADER: &[&str] = &[
    ":ID(Concept-ID)",
    "concept_id:long",
    ":LABEL",
    "name:string",
    "domain_id:string",
    "vocabulary_id:string",
    "concept_class_id:string",
    "standard_concept:string",
    "concept_code:string",
    "valid_start_date:date",
    "valid_end_date:date",
    "invalid_reason:string",
    "synonyms:string[]",
];

pub const IN_DOMAIN_HEADER: &[&str] = &[":START_ID(Concept-ID)", ":END_ID(Domain-ID)", ":TYPE"];

pub const FROM_VOCABULARY_HEADER: &[&str] =
    &[":START_ID(Concept-ID)", ":END_ID(Vocabulary-ID)", ":TYPE"];

pub const SEMANTIC_HEADER: &[&str] = &[
    ":START_ID(Concept-ID)",
    ":END_ID(Concept-ID)",
    ":TYPE",
    "relationship_id:string",
    "valid_start_date:date",
    "valid_end_date:date",
    "invalid_reason:string",
];

pub const ANCESTOR_HEADER: &[&str] = &[
    ":START_ID(Concept-ID)",
    ":END_ID(Concept-ID)",
    ":TYPE",
    "min_levels:int",
    "max_levels:int",
];

/// Whether a record file holds nodes or relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Node,
    Relationship,
}

/// One graph record file produced by the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFile {
    DomainNodes,
    VocabularyNodes,
    ConceptNodes,
    InDomain,
    FromVocabulary,
    Semantic,
    Ancestor,
}

impl RecordFile {
    /// All record files, nodes first, in load order.
    pub const ALL: [RecordFile; 7] = [
        RecordFile::DomainNodes,
        RecordFile::VocabularyNodes,
        RecordFile::ConceptNodes,
        RecordFile::InDomain,
        RecordFile::FromVocabulary,
        RecordFile::Semantic,
        RecordFile::Ancestor,
    ];

    fn stem(&self) -> &'static str {
        match self {
            RecordFile::DomainNodes => "nodes_domain",
            RecordFile::VocabularyNodes => "nodes_vocabulary",
            RecordFile::ConceptNodes => "nodes_concept",
            RecordFile::InDomain => "rels_in_domain",
            RecordFile::FromVocabulary => "rels_from_vocabulary",
            RecordFile::Semantic => "rels_semantic",
            RecordFile::Ancestor => "rels_ancestor",
        }
    }

    /// Data file name, e.g. `nodes_concept.csv`.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.stem())
    }

    /// Header-only companion used by the bulk path, e.g. `nodes_concept_header.csv`.
    pub fn header_file_name(&self) -> String {
        format!("{}_header.csv", self.stem())
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            RecordFile::DomainNodes => DOMAIN_NODE_HEADER,
            RecordFile::VocabularyNodes => VOCABULARY_NODE_HEADER,
            RecordFile::ConceptNodes => CONCEPT_NODE_HEADER,
            RecordFile::InDomain => IN_DOMAIN_HEADER,
            RecordFile::FromVocabulary => FROM_VOCABULARY_HEADER,
            RecordFile::Semantic => SEMANTIC_HEADER,
            RecordFile::Ancestor => ANCESTOR_HEADER,
        }
    }

    /// Contextual edge files. Online loading creates these edges with the
    /// concept nodes, so only the bulk importer reads them.
    pub fn is_bulk_only(&self) -> bool {
        matches!(self, RecordFile::InDomain | RecordFile::FromVocabulary)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            RecordFile::DomainNodes | RecordFile::VocabularyNodes | RecordFile::ConceptNodes => {
                RecordKind::Node
            }
            _ => RecordKind::Relationship,
        }
    }
}

/// Parse a `:date` field. Only zero-padded `YYYY-MM-DD` is accepted, which is
/// also the only form the server's `date()` takes.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, RECORD_DATE_FORMAT).ok()
}

impl fmt::Display for RecordFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dates_must_be_padded() {
        assert_eq!(
            parse_record_date("2020-01-05"),
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
        assert_eq!(parse_record_date("2020-1-5"), None);
        assert_eq!(parse_record_date("2020-01-5"), None);
        assert_eq!(parse_record_date("20200105"), None);
        assert_eq!(parse_record_date("2020-02-30"), None);
        assert_eq!(parse_record_date(" 2020-01-05"), None);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(RecordFile::ConceptNodes.file_name(), "nodes_concept.csv");
        assert_eq!(
            RecordFile::FromVocabulary.header_file_name(),
            "rels_from_vocabulary_header.csv"
        );
    }

    #[test]
    fn test_nodes_precede_relationships() {
        let kinds: Vec<RecordKind> = RecordFile::ALL.iter().map(|f| f.kind()).collect();
        let first_rel = kinds
            .iter()
            .position(|k| *k == RecordKind::Relationship)
            .unwrap();
        assert!(kinds[first_rel..]
            .iter()
            .all(|k| *k == RecordKind::Relationship));
        assert_eq!(first_rel, 3);
    }

    #[test]
    fn test_relationship_headers_start_with_endpoints() {
        for file in RecordFile::ALL {
            if file.kind() == RecordKind::Relationship {
                let header = file.header();
                assert!(header[0].starts_with(":START_ID"), "{file}");
                assert!(header[1].starts_with(":END_ID"), "{file}");
                assert_eq!(header[2], ":TYPE");
            }
        }
    }

    #[test]
    fn test_every_node_header_has_label_column() {
        for file in RecordFile::ALL {
            if file.kind() == RecordKind::Node {
                assert!(file.header().contains(&":LABEL"), "{file}");
            }
        }
    }
}
