//! VocabGraph Store - destination graph access
//!
//! This crate provides the graph-side half of the pipeline:
//! - The `GraphStore` seam with Neo4j and in-memory implementations
//! - Schema definitions and standalone clearing
//! - The online loader state machine
//! - Post-load validation reports

pub mod cypher;
pub mod error;
pub mod loader;
pub mod memory;
pub mod neo4j;
pub mod traits;
pub mod types;
pub mod validate;

pub use error::{LoadError, StoreError};
pub use traits::GraphStore;
pub use types::{
    ConceptProbe, ConceptProperties, CountMap, Direction, ProbeOutcome, RecordSource,
    RelationshipSummary, SchemaDefinition, SchemaKind, SchemaObject, REQUIRED_SCHEMA,
};

// Store implementations
pub use memory::MemoryGraph;
pub use neo4j::{Neo4jSettings, Neo4jStore};

// Loader and validator
pub use loader::{
    clear_graph, create_schema, ClearReport, LoadReport, LoadSettings, LoadStage, OnlineLoader,
    StageReport, DEFAULT_BATCH_SIZE,
};
pub use validate::{ValidationReport, Validator, DEFAULT_GROUP_LIMIT, DEFAULT_NEIGHBOR_SAMPLE};
