//! Store and loader error types.

use crate::loader::LoadStage;
use std::path::PathBuf;
use thiserror::Error;
use vocabgraph_core::RecordFile;

/// Errors raised by a [`GraphStore`](crate::GraphStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Destination unreachable or authentication rejected
    #[error("connection failed: {0}")]
    Connection(String),

    /// A statement was rejected or failed while running
    #[error("query failed ({context}): {message}")]
    Query { context: String, message: String },

    /// A result row did not have the expected shape
    #[error("unexpected result for {context}: {message}")]
    Decode { context: String, message: String },

    /// One batch of a record file failed; earlier batches stay committed
    #[error("batch {batch} of {file} failed: {message}")]
    Batch {
        file: RecordFile,
        batch: usize,
        message: String,
    },

    /// The file is not applied by online loading
    #[error("{0} is only read by the bulk importer")]
    BulkOnly(RecordFile),

    /// A record file could not be read
    #[error("failed to read record file '{path}': {source}")]
    RecordFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn query(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Query {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn batch(file: RecordFile, batch: usize, message: impl Into<String>) -> Self {
        Self::Batch {
            file,
            batch,
            message: message.into(),
        }
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        StoreError::query("neo4j", err)
    }
}

/// Errors raised by the online loader.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A record file is missing before anything was changed
    #[error("record file '{path}' not found; run the transformer first")]
    MissingRecordFile { path: PathBuf },

    /// A stage failed; later stages were not run
    #[error("load failed during {stage}: {source}")]
    Stage {
        stage: LoadStage,
        #[source]
        source: StoreError,
    },
}

impl LoadError {
    pub fn stage(stage: LoadStage, source: StoreError) -> Self {
        Self::Stage { stage, source }
    }

    /// Stage that failed, if any mutation was attempted.
    pub fn failed_stage(&self) -> Option<LoadStage> {
        match self {
            LoadError::Stage { stage, .. } => Some(*stage),
            LoadError::MissingRecordFile { .. } => None,
        }
    }
}
