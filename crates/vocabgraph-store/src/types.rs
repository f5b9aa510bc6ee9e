//! Shared types for graph store operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use vocabgraph_core::{RecordFile, CONCEPT_LABEL, DOMAIN_LABEL, STANDARD_LABEL, VOCABULARY_LABEL};

/// Counts keyed by label-set or relationship type.
pub type CountMap = BTreeMap<String, u64>;

// ============================================================================
// Schema
// ============================================================================

/// Kind of schema object in the destination catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Constraint,
    Index,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Constraint => write!(f, "constraint"),
            SchemaKind::Index => write!(f, "index"),
        }
    }
}

/// A schema object found in the destination catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    pub name: String,
    pub kind: SchemaKind,
}

impl SchemaObject {
    pub fn constraint(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SchemaKind::Constraint,
        }
    }

    pub fn index(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SchemaKind::Index,
        }
    }
}

/// A constraint or index the pipeline creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    pub name: &'static str,
    pub kind: SchemaKind,
    pub label: &'static str,
    pub property: &'static str,
}

impl SchemaDefinition {
    /// Idempotent creation statement.
    pub fn create_statement(&self) -> String {
        match self.kind {
            SchemaKind::Constraint => format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                self.name, self.label, self.property
            ),
            SchemaKind::Index => format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
                self.name, self.label, self.property
            ),
        }
    }

    pub fn as_object(&self) -> SchemaObject {
        SchemaObject {
            name: self.name.to_string(),
            kind: self.kind,
        }
    }
}

/// Uniqueness constraints on the three identifiers plus lookup indexes by
/// source code and by the standard marker label.
pub const REQUIRED_SCHEMA: [SchemaDefinition; 5] = [
    SchemaDefinition {
        name: "constraint_concept_id",
        kind: SchemaKind::Constraint,
        label: CONCEPT_LABEL,
        property: "concept_id",
    },
    SchemaDefinition {
        name: "constraint_domain_id",
        kind: SchemaKind::Constraint,
        label: DOMAIN_LABEL,
        property: "domain_id",
    },
    SchemaDefinition {
        name: "constraint_vocabulary_id",
        kind: SchemaKind::Constraint,
        label: VOCABULARY_LABEL,
        property: "vocabulary_id",
    },
    SchemaDefinition {
        name: "index_concept_code",
        kind: SchemaKind::Index,
        label: CONCEPT_LABEL,
        property: "concept_code",
    },
    SchemaDefinition {
        name: "index_standard_label",
        kind: SchemaKind::Index,
        label: STANDARD_LABEL,
        property: "concept_id",
    },
];

// ============================================================================
// Record sources
// ============================================================================

/// Where a record file can be read from.
///
/// Server-side loaders use `uri`, which the destination resolves against its
/// own import directory. In-process stores read `local_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSource {
    pub file: RecordFile,
    pub local_path: PathBuf,
    pub uri: String,
}

// ============================================================================
// Probe
// ============================================================================

/// Typed properties of a concept node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptProperties {
    pub concept_id: i64,
    pub name: String,
    pub domain_id: String,
    pub vocabulary_id: String,
    pub concept_class_id: String,
    pub standard_concept: Option<String>,
    pub concept_code: String,
    pub valid_start_date: Option<NaiveDate>,
    pub valid_end_date: Option<NaiveDate>,
    pub invalid_reason: Option<String>,
}

/// Direction of a relationship relative to the probed concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "->"),
            Direction::Incoming => write!(f, "<-"),
        }
    }
}

/// Incident relationships of one type and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub rel_type: String,
    pub direction: Direction,
    pub count: u64,
    /// First few neighbor names, sorted
    pub sample_neighbors: Vec<String>,
}

/// Structural snapshot of one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptProbe {
    pub properties: ConceptProperties,
    pub labels: Vec<String>,
    pub synonyms: Vec<String>,
    pub synonym_count: usize,
    pub relationships: Vec<RelationshipSummary>,
}

impl ConceptProbe {
    pub fn relationship(&self, rel_type: &str, direction: Direction) -> Option<&RelationshipSummary> {
        self.relationships
            .iter()
            .find(|r| r.rel_type == rel_type && r.direction == direction)
    }
}

/// Probe result. Absence is a value; query failures are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Found(Box<ConceptProbe>),
    NotFound { concept_id: i64 },
}

impl ProbeOutcome {
    pub fn found(&self) -> Option<&ConceptProbe> {
        match self {
            ProbeOutcome::Found(probe) => Some(probe),
            ProbeOutcome::NotFound { .. } => None,
        }
    }
}

/// Display name of a neighbor node: concept name, else the reference
/// entity's name, else its identifier.
pub fn neighbor_name<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_statement() {
        assert_eq!(
            REQUIRED_SCHEMA[0].create_statement(),
            "CREATE CONSTRAINT constraint_concept_id IF NOT EXISTS FOR (n:Concept) REQUIRE n.concept_id IS UNIQUE"
        );
    }

    #[test]
    fn test_index_statement() {
        assert_eq!(
            REQUIRED_SCHEMA[4].create_statement(),
            "CREATE INDEX index_standard_label IF NOT EXISTS FOR (n:Standard) ON (n.concept_id)"
        );
    }

    #[test]
    fn test_required_schema_names_are_unique() {
        let mut names: Vec<&str> = REQUIRED_SCHEMA.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REQUIRED_SCHEMA.len());
    }

    #[test]
    fn test_neighbor_name_fallback() {
        assert_eq!(neighbor_name([None, Some(""), Some("Drug")]), "Drug");
        assert_eq!(neighbor_name([Some("enalapril"), Some("x")]), "enalapril");
        assert_eq!(neighbor_name([None, None]), "");
    }

    #[test]
    fn test_not_found_serializes_with_status() {
        let json = serde_json::to_value(ProbeOutcome::NotFound { concept_id: 42 }).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["concept_id"], 42);
    }
}
