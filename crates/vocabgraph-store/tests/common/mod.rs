//! Shared helpers for store integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use tempfile::TempDir;
use vocabgraph_core::{RecordFile, TransformConfig, Transformer};
use vocabgraph_store::{
    CountMap, GraphStore, LoadSettings, MemoryGraph, ProbeOutcome, RecordSource,
    SchemaDefinition, SchemaObject, StoreError,
};

/// Extract fixtures shared with the core crate.
pub fn extract_fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("vocabgraph-core")
        .join("tests")
        .join("fixtures")
        .join("extract")
}

/// Transform the fixtures into a fresh temp dir and return load settings for it.
pub fn transformed_fixtures() -> (TempDir, LoadSettings) {
    let temp = TempDir::new().unwrap();
    Transformer::new(TransformConfig::new(extract_fixtures(), temp.path()))
        .run()
        .unwrap();
    let settings = LoadSettings::new(temp.path()).with_batch_size(1);
    (temp, settings)
}

/// Wraps a [`MemoryGraph`] and fails the first load of one record file.
pub struct FailingStore {
    pub inner: MemoryGraph,
    pub fail_on: RecordFile,
    pub loaded: Mutex<Vec<RecordFile>>,
}

impl FailingStore {
    pub fn new(fail_on: RecordFile) -> Self {
        Self {
            inner: MemoryGraph::new(),
            fail_on,
            loaded: Mutex::new(Vec::new()),
        }
    }

    pub fn loaded(&self) -> Vec<RecordFile> {
        self.loaded.lock().clone()
    }
}

#[async_trait]
impl GraphStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn schema_catalog(&self) -> Result<Vec<SchemaObject>, StoreError> {
        self.inner.schema_catalog().await
    }

    async fn drop_schema_object(&self, object: &SchemaObject) -> Result<(), StoreError> {
        self.inner.drop_schema_object(object).await
    }

    async fn create_schema_object(&self, definition: &SchemaDefinition) -> Result<(), StoreError> {
        self.inner.create_schema_object(definition).await
    }

    async fn delete_all(&self, batch_size: usize) -> Result<(), StoreError> {
        self.inner.delete_all(batch_size).await
    }

    async fn load_records(
        &self,
        source: &RecordSource,
        batch_size: usize,
    ) -> Result<u64, StoreError> {
        if source.file == self.fail_on {
            return Err(StoreError::batch(source.file, 1, "injected failure"));
        }
        self.loaded.lock().push(source.file);
        self.inner.load_records(source, batch_size).await
    }

    async fn node_label_counts(&self) -> Result<CountMap, StoreError> {
        self.inner.node_label_counts().await
    }

    async fn relationship_type_counts(&self) -> Result<CountMap, StoreError> {
        self.inner.relationship_type_counts().await
    }

    async fn probe_concept(
        &self,
        concept_id: i64,
        neighbor_sample: usize,
        group_limit: usize,
    ) -> Result<ProbeOutcome, StoreError> {
        self.inner
            .probe_concept(concept_id, neighbor_sample, group_limit)
            .await
    }
}
