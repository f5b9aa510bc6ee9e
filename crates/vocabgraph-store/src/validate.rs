//! Read-only post-load checks.
//!
//! Mismatches are report data, never errors. Only store failures surface as
//! `Err`.

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::StoreError;
use crate::traits::GraphStore;
use crate::types::{CountMap, ProbeOutcome};

/// Default relationship groups returned by a probe.
pub const DEFAULT_GROUP_LIMIT: usize = 25;
/// Default neighbor names kept per group.
pub const DEFAULT_NEIGHBOR_SAMPLE: usize = 3;

/// Result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub node_counts: CountMap,
    pub relationship_counts: CountMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeOutcome>,
}

impl ValidationReport {
    pub fn total_nodes(&self) -> u64 {
        self.node_counts.values().sum()
    }

    pub fn total_relationships(&self) -> u64 {
        self.relationship_counts.values().sum()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node counts by label set ({} total):", self.total_nodes())?;
        for (labels, count) in &self.node_counts {
            writeln!(f, "  {:<40} {:>12}", labels, count)?;
        }
        writeln!(
            f,
            "Relationship counts by type ({} total):",
            self.total_relationships()
        )?;
        for (rel_type, count) in &self.relationship_counts {
            writeln!(f, "  {:<40} {:>12}", rel_type, count)?;
        }

        match &self.probe {
            None => Ok(()),
            Some(ProbeOutcome::NotFound { concept_id }) => {
                writeln!(f, "Concept {} not found", concept_id)
            }
            Some(ProbeOutcome::Found(probe)) => {
                let p = &probe.properties;
                writeln!(f, "Concept {} ({}):", p.concept_id, p.name)?;
                writeln!(f, "  labels:     {}", probe.labels.join(", "))?;
                writeln!(f, "  domain:     {}", p.domain_id)?;
                writeln!(f, "  vocabulary: {} ({})", p.vocabulary_id, p.concept_code)?;
                writeln!(f, "  class:      {}", p.concept_class_id)?;
                writeln!(
                    f,
                    "  synonyms:   {} [{}]",
                    probe.synonym_count,
                    probe.synonyms.join(", ")
                )?;
                for rel in &probe.relationships {
                    writeln!(
                        f,
                        "  {} {:<24} {:>8}  {}",
                        rel.direction,
                        rel.rel_type,
                        rel.count,
                        rel.sample_neighbors.join(", ")
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Runs counts and probes against a store.
pub struct Validator<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    neighbor_sample: usize,
    group_limit: usize,
}

impl<'a, S: GraphStore + ?Sized> Validator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            neighbor_sample: DEFAULT_NEIGHBOR_SAMPLE,
            group_limit: DEFAULT_GROUP_LIMIT,
        }
    }

    pub fn with_limits(mut self, neighbor_sample: usize, group_limit: usize) -> Self {
        self.neighbor_sample = neighbor_sample;
        self.group_limit = group_limit;
        self
    }

    pub async fn node_counts(&self) -> Result<CountMap, StoreError> {
        self.store.node_label_counts().await
    }

    pub async fn relationship_counts(&self) -> Result<CountMap, StoreError> {
        self.store.relationship_type_counts().await
    }

    pub async fn probe(&self, concept_id: i64) -> Result<ProbeOutcome, StoreError> {
        self.store
            .probe_concept(concept_id, self.neighbor_sample, self.group_limit)
            .await
    }

    /// Counts plus an optional probe of one concept.
    pub async fn run(&self, concept_id: Option<i64>) -> Result<ValidationReport, StoreError> {
        let node_counts = self.node_counts().await?;
        let relationship_counts = self.relationship_counts().await?;
        info!(
            "Graph holds {} label sets and {} relationship types",
            node_counts.len(),
            relationship_counts.len()
        );

        let probe = match concept_id {
            Some(id) => Some(self.probe(id).await?),
            None => None,
        };

        Ok(ValidationReport {
            node_counts,
            relationship_counts,
            probe,
        })
    }
}
