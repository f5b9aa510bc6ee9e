//! VocabGraph Core - relational vocabulary extracts to graph record files
//!
//! This crate provides the file-side half of the pipeline:
//! - Sanitizer for graph-safe labels and relationship types
//! - Concept label derivation and synonym parsing
//! - Chunked, order-preserving transformation of extract files
//! - Bulk-import file pairs and the `neo4j-admin` command
//! - Export statements and a partial-file-safe extract sink

pub mod bulk;
pub mod chunks;
pub mod error;
pub mod extract;
pub mod model;
pub mod records;
pub mod sanitize;
pub mod transform;

pub use error::{ExtractError, TransformError};
pub use sanitize::{standardize_label, standardize_reltype};

pub use model::{
    concept_labels, parse_synonyms, LabelSet, ARRAY_DELIMITER, CONCEPT_LABEL, DOMAIN_LABEL,
    FROM_VOCABULARY, HAS_ANCESTOR, IN_DOMAIN, STANDARD_LABEL, STANDARD_MARKER, VOCABULARY_LABEL,
};
pub use records::{parse_record_date, RecordFile, RecordKind};

// Transformer re-exports
pub use chunks::{Chunk, ChunkedReader, ColumnIndex};
pub use transform::{
    HeaderMode, OutputSummary, TransformConfig, TransformSummary, Transformer, DEFAULT_CHUNK_SIZE,
};

// Bulk and extract re-exports
pub use bulk::{BulkImportPlan, BulkPreparer, FilePair};
pub use extract::{ExtractFileWriter, ExtractTable};
