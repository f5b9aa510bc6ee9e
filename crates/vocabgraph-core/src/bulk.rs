//! Offline bulk-import preparation.
//!
//! Writes header/data file pairs and renders the `neo4j-admin database import`
//! command that consumes them. The command is generated, never executed. The
//! database must be stopped while it runs, and schema creation has to be run
//! afterwards because the importer does not enforce uniqueness.

use crate::error::TransformError;
use crate::model::ARRAY_DELIMITER;
use crate::records::{RecordFile, RecordKind};
use crate::transform::{HeaderMode, TransformConfig, TransformSummary, Transformer};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// A header file and the data file it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    pub file: RecordFile,
    pub header: PathBuf,
    pub data: PathBuf,
}

impl FilePair {
    fn argument(&self) -> String {
        format!("{},{}", self.header.display(), self.data.display())
    }
}

/// Everything needed to run an offline import.
#[derive(Debug, Clone, Serialize)]
pub struct BulkImportPlan {
    pub database: String,
    pub nodes: Vec<FilePair>,
    pub relationships: Vec<FilePair>,
    pub summary: TransformSummary,
}

impl BulkImportPlan {
    /// Build a plan for record files laid out under `dir`.
    pub fn for_directory(dir: impl Into<PathBuf>, database: impl Into<String>) -> Self {
        let dir = dir.into();
        let mut nodes = Vec::new();
        let mut relationships = Vec::new();
        for file in RecordFile::ALL {
            let pair = FilePair {
                file,
                header: dir.join(file.header_file_name()),
                data: dir.join(file.file_name()),
            };
            match file.kind() {
                RecordKind::Node => nodes.push(pair),
                RecordKind::Relationship => relationships.push(pair),
            }
        }
        Self {
            database: database.into(),
            nodes,
            relationships,
            summary: TransformSummary::default(),
        }
    }

    /// Render the shell command, one option per line.
    pub fn render(&self) -> String {
        let mut lines = vec!["neo4j-admin database import full \\".to_string()];
        for pair in &self.nodes {
            lines.push(format!("  --nodes='{}' \\", pair.argument()));
        }
        for pair in &self.relationships {
            lines.push(format!("  --relationships='{}' \\", pair.argument()));
        }
        lines.push(format!(
            "  --delimiter=',' --array-delimiter='{}' --multiline-fields=true \\",
            ARRAY_DELIMITER
        ));
        lines.push(format!("  {}", self.database));
        lines.join("\n")
    }
}

impl fmt::Display for BulkImportPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Produces bulk-import file pairs from the extract files.
pub struct BulkPreparer {
    transformer: Transformer,
    database: String,
}

impl BulkPreparer {
    pub fn new(config: TransformConfig, database: impl Into<String>) -> Self {
        let config = config.with_header_mode(HeaderMode::Separate);
        Self {
            transformer: Transformer::new(config),
            database: database.into(),
        }
    }

    /// Transform every table and return the import plan.
    pub fn prepare(&self) -> Result<BulkImportPlan, TransformError> {
        let output_dir = self.transformer.config().output_dir.clone();
        info!("Preparing bulk import files in {:?}", output_dir);

        let summary = self.transformer.run()?;
        let mut plan = BulkImportPlan::for_directory(&output_dir, self.database.clone());
        plan.summary = summary;

        info!("Generated neo4j-admin command:\n{}", plan.render());
        Ok(plan)
    }
}
