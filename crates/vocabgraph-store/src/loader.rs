//! Online full reload.
//!
//! Drives a [`GraphStore`] through
//! `Idle → Clearing → SchemaCreation → LoadMetadata → LoadConcepts →
//! LoadSemanticEdges → LoadAncestorEdges → Done`. The first failing stage
//! moves the loader to `Failed` and nothing after it runs. Committed batches
//! are never compensated; recovery is clear and reload.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{LoadError, StoreError};
use crate::traits::GraphStore;
use crate::types::{RecordSource, SchemaKind, REQUIRED_SCHEMA};
use vocabgraph_core::RecordFile;

/// Default rows per committed batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Position of the online loader in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStage {
    Idle,
    Clearing,
    SchemaCreation,
    LoadMetadata,
    LoadConcepts,
    LoadSemanticEdges,
    LoadAncestorEdges,
    Done,
    Failed,
}

impl LoadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStage::Idle => "idle",
            LoadStage::Clearing => "clearing",
            LoadStage::SchemaCreation => "schema-creation",
            LoadStage::LoadMetadata => "load-metadata",
            LoadStage::LoadConcepts => "load-concepts",
            LoadStage::LoadSemanticEdges => "load-semantic-edges",
            LoadStage::LoadAncestorEdges => "load-ancestor-edges",
            LoadStage::Done => "done",
            LoadStage::Failed => "failed",
        }
    }

    /// Successor on success. `Done` and `Failed` are terminal.
    pub fn next(self) -> Option<LoadStage> {
        match self {
            LoadStage::Idle => Some(LoadStage::Clearing),
            LoadStage::Clearing => Some(LoadStage::SchemaCreation),
            LoadStage::SchemaCreation => Some(LoadStage::LoadMetadata),
            LoadStage::LoadMetadata => Some(LoadStage::LoadConcepts),
            LoadStage::LoadConcepts => Some(LoadStage::LoadSemanticEdges),
            LoadStage::LoadSemanticEdges => Some(LoadStage::LoadAncestorEdges),
            LoadStage::LoadAncestorEdges => Some(LoadStage::Done),
            LoadStage::Done | LoadStage::Failed => None,
        }
    }

    /// Record files a load stage applies, in order.
    ///
    /// Concept rows create their contextual edges in the same batch, so the
    /// separate contextual edge files are only needed by the bulk path.
    pub fn record_files(self) -> &'static [RecordFile] {
        match self {
            LoadStage::LoadMetadata => &[RecordFile::DomainNodes, RecordFile::VocabularyNodes],
            LoadStage::LoadConcepts => &[RecordFile::ConceptNodes],
            LoadStage::LoadSemanticEdges => &[RecordFile::Semantic],
            LoadStage::LoadAncestorEdges => &[RecordFile::Ancestor],
            _ => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stages that do work, in run order.
const WORK_STAGES: [LoadStage; 6] = [
    LoadStage::Clearing,
    LoadStage::SchemaCreation,
    LoadStage::LoadMetadata,
    LoadStage::LoadConcepts,
    LoadStage::LoadSemanticEdges,
    LoadStage::LoadAncestorEdges,
];

/// Settings for one online load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    /// Directory holding the record files
    pub output_dir: PathBuf,
    /// Prefix the destination resolves record file names against
    pub import_uri_prefix: String,
    pub batch_size: usize,
    /// Leave existing data and schema in place
    pub skip_clear: bool,
}

impl LoadSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            import_uri_prefix: "file:///".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            skip_clear: false,
        }
    }

    pub fn with_import_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.import_uri_prefix = prefix.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_skip_clear(mut self, skip_clear: bool) -> Self {
        self.skip_clear = skip_clear;
        self
    }

    pub fn source(&self, file: RecordFile) -> RecordSource {
        RecordSource {
            file,
            local_path: self.output_dir.join(file.file_name()),
            uri: format!("{}{}", self.import_uri_prefix, file.file_name()),
        }
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: LoadStage,
    pub elapsed_ms: u64,
    /// Rows applied (load stages) or schema objects touched
    pub rows: u64,
    pub skipped: bool,
}

/// Outcome of a completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub stages: Vec<StageReport>,
    pub elapsed_ms: u64,
}

impl LoadReport {
    pub fn stage(&self, stage: LoadStage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn rows_loaded(&self) -> u64 {
        self.stages
            .iter()
            .filter(|s| !s.stage.record_files().is_empty())
            .map(|s| s.rows)
            .sum()
    }
}

/// What [`clear_graph`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub constraints_dropped: usize,
    pub indexes_dropped: usize,
}

/// Drop every constraint, then every remaining droppable index, then delete
/// all nodes and relationships.
pub async fn clear_graph<S>(store: &S, batch_size: usize) -> Result<ClearReport, StoreError>
where
    S: GraphStore + ?Sized,
{
    let catalog = store.schema_catalog().await?;
    let mut report = ClearReport::default();

    // Constraints own indexes, so they go first
    for kind in [SchemaKind::Constraint, SchemaKind::Index] {
        for object in catalog.iter().filter(|o| o.kind == kind) {
            store.drop_schema_object(object).await?;
            match kind {
                SchemaKind::Constraint => report.constraints_dropped += 1,
                SchemaKind::Index => report.indexes_dropped += 1,
            }
        }
    }
    info!(
        "Dropped {} constraints and {} indexes",
        report.constraints_dropped, report.indexes_dropped
    );

    store.delete_all(batch_size).await?;
    info!("Deleted all nodes and relationships");
    Ok(report)
}

/// Create the uniqueness constraints and lookup indexes. Safe to repeat.
pub async fn create_schema<S>(store: &S) -> Result<usize, StoreError>
where
    S: GraphStore + ?Sized,
{
    for definition in &REQUIRED_SCHEMA {
        store.create_schema_object(definition).await?;
    }
    info!("Ensured {} schema objects", REQUIRED_SCHEMA.len());
    Ok(REQUIRED_SCHEMA.len())
}

/// Online loader bound to one store and one set of record files.
pub struct OnlineLoader<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    settings: LoadSettings,
    stage: LoadStage,
}

impl<'a, S: GraphStore + ?Sized> OnlineLoader<'a, S> {
    pub fn new(store: &'a S, settings: LoadSettings) -> Self {
        Self {
            store,
            settings,
            stage: LoadStage::Idle,
        }
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    /// Fail before any mutation if a record file is missing.
    pub fn check_record_files(&self) -> Result<(), LoadError> {
        for stage in WORK_STAGES {
            for file in stage.record_files() {
                let path = self.settings.output_dir.join(file.file_name());
                if !path.is_file() {
                    return Err(LoadError::MissingRecordFile { path });
                }
            }
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<LoadReport, LoadError> {
        self.run_with(|_| {}).await
    }

    /// Run every stage, calling `on_stage` as each one starts.
    pub async fn run_with<F>(&mut self, mut on_stage: F) -> Result<LoadReport, LoadError>
    where
        F: FnMut(LoadStage) + Send,
    {
        if self.stage != LoadStage::Idle {
            warn!("Loader restarted from {}", self.stage);
            self.stage = LoadStage::Idle;
        }
        self.check_record_files()?;

        let started = Instant::now();
        let mut report = LoadReport::default();

        while let Some(stage) = self.stage.next() {
            self.stage = stage;
            if stage == LoadStage::Done {
                break;
            }
            on_stage(stage);

            let stage_started = Instant::now();
            let skipped = stage == LoadStage::Clearing && self.settings.skip_clear;
            let rows = if skipped {
                info!("Skipping {}", stage);
                0
            } else {
                info!("Starting {}", stage);
                match self.run_stage(stage).await {
                    Ok(rows) => rows,
                    Err(source) => {
                        self.stage = LoadStage::Failed;
                        return Err(LoadError::stage(stage, source));
                    }
                }
            };

            let elapsed_ms = stage_started.elapsed().as_millis() as u64;
            info!("Finished {} ({} rows, {}ms)", stage, rows, elapsed_ms);
            report.stages.push(StageReport {
                stage,
                elapsed_ms,
                rows,
                skipped,
            });
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn run_stage(&self, stage: LoadStage) -> Result<u64, StoreError> {
        match stage {
            LoadStage::Clearing => {
                let cleared = clear_graph(self.store, self.settings.batch_size).await?;
                Ok((cleared.constraints_dropped + cleared.indexes_dropped) as u64)
            }
            LoadStage::SchemaCreation => Ok(create_schema(self.store).await? as u64),
            _ => {
                let mut rows = 0;
                for file in stage.record_files() {
                    let source = self.settings.source(*file);
                    debug!("Applying {} from {:?}", file, source.local_path);
                    rows += self
                        .store
                        .load_records(&source, self.settings.batch_size)
                        .await?;
                }
                Ok(rows)
            }
        }
    }
}
