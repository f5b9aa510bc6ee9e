//! Graph store trait definition.
//!
//! Defines the async interface the loader and validator drive. Implemented by
//! the Neo4j client and by the in-process petgraph store.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{CountMap, ProbeOutcome, RecordSource, SchemaDefinition, SchemaObject};

/// Destination labeled property graph.
///
/// Callers issue one operation at a time and wait for it; implementations
/// never see two concurrent batches from the same run.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short name for logs (e.g. "neo4j").
    fn name(&self) -> &str;

    /// List droppable constraints and indexes from the live catalog.
    ///
    /// Token lookup indexes and indexes owned by a constraint are excluded.
    async fn schema_catalog(&self) -> Result<Vec<SchemaObject>, StoreError>;

    /// Drop one schema object. Dropping a missing object is not an error.
    async fn drop_schema_object(&self, object: &SchemaObject) -> Result<(), StoreError>;

    /// Create a schema object. Creating an existing object is a no-op.
    async fn create_schema_object(&self, definition: &SchemaDefinition) -> Result<(), StoreError>;

    /// Delete every node and relationship in batches of `batch_size` nodes.
    async fn delete_all(&self, batch_size: usize) -> Result<(), StoreError>;

    /// Apply a record file in committed batches of `batch_size` rows.
    ///
    /// Each batch commits before the next starts. A failing batch rolls back
    /// alone and the error is returned; earlier batches stay. Returns the
    /// number of rows applied.
    async fn load_records(&self, source: &RecordSource, batch_size: usize)
        -> Result<u64, StoreError>;

    /// Node counts keyed by sorted label set joined with `:`.
    async fn node_label_counts(&self) -> Result<CountMap, StoreError>;

    /// Relationship counts keyed by type.
    async fn relationship_type_counts(&self) -> Result<CountMap, StoreError>;

    /// Fetch one concept with a bounded sample of its relationships.
    ///
    /// # Arguments
    /// * `concept_id` - Concept to inspect
    /// * `neighbor_sample` - Neighbor names kept per relationship group
    /// * `group_limit` - Maximum relationship groups returned
    async fn probe_concept(
        &self,
        concept_id: i64,
        neighbor_sample: usize,
        group_limit: usize,
    ) -> Result<ProbeOutcome, StoreError>;
}
