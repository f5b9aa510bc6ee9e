//! VocabGraph Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.vocabgraph/config.toml`
//! - Local config: `.vocabgraph/config.toml` (in the working directory)
//! - An explicit config file passed on the command line
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → explicit → CLI overrides.
//! The merged value is immutable once handed to the pipeline.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default rows per online load transaction.
pub const DEFAULT_LOAD_BATCH_SIZE: usize = 10_000;

/// Default rows per transformer chunk.
pub const DEFAULT_TRANSFORM_CHUNK_SIZE: usize = 100_000;

/// Concept probed by `validate` when none is given (Enalapril).
pub const DEFAULT_SAMPLE_CONCEPT_ID: i64 = 1_177_480;

static SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Root configuration for VocabGraph.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct VocabConfig {
    /// Directory layout
    pub paths: PathsConfig,

    /// Relational source (PostgreSQL)
    pub source: SourceConfig,

    /// Destination graph (Neo4j)
    pub graph: GraphConfig,

    /// Chunk and batch sizes
    pub tuning: TuningConfig,

    /// Post-load validation
    pub validation: ValidationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Directory layout for extract, transform and bulk files.
///
/// # Example TOML
///
/// ```toml
/// [paths]
/// export_dir = "export"
/// output_dir = "/var/lib/neo4j/import"
/// bulk_dir = "bulk_import"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Where extraction writes the raw table files
    pub export_dir: PathBuf,

    /// Where the transformer writes record files for the online load.
    /// Must be the graph server's import directory.
    pub output_dir: PathBuf,

    /// Where bulk header/data file pairs are written
    pub bulk_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("export"),
            output_dir: PathBuf::from("import"),
            bulk_dir: PathBuf::from("bulk_import"),
        }
    }
}

/// PostgreSQL connection settings for extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub user: String,

    /// Environment variable holding the password
    pub password_env: String,

    pub database: String,

    /// Schema holding the vocabulary tables
    pub schema: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password_env: "PGPASSWORD".to_string(),
            database: "ohdsi".to_string(),
            schema: "cdm_v5".to_string(),
        }
    }
}

impl SourceConfig {
    /// Connection URL without the password.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Neo4j connection and import settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Bolt URI
    pub uri: String,

    pub user: String,

    /// Environment variable holding the password
    pub password_env: String,

    /// Target database name
    pub database: String,

    /// Prefix the server resolves against its import directory
    pub import_uri_prefix: String,

    /// Connection pool size
    pub max_connections: usize,

    /// Rows fetched per pull when streaming results
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password_env: "NEO4J_PASSWORD".to_string(),
            database: "neo4j".to_string(),
            import_uri_prefix: "file:///".to_string(),
            max_connections: 4,
            fetch_size: 500,
        }
    }
}

/// Chunk and batch sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TuningConfig {
    /// Rows committed per online load transaction
    pub load_batch_size: usize,

    /// Rows read per transformer chunk
    pub transform_chunk_size: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
            transform_chunk_size: DEFAULT_TRANSFORM_CHUNK_SIZE,
        }
    }
}

/// Settings for the post-load validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Concept probed by default
    pub sample_concept_id: i64,

    /// Neighbor names kept per relationship group
    pub neighbor_sample: usize,

    /// Maximum relationship groups reported by the probe
    pub relationship_group_limit: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sample_concept_id: DEFAULT_SAMPLE_CONCEPT_ID,
            neighbor_sample: 3,
            relationship_group_limit: 25,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,

    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override Neo4j URI
    pub graph_uri: Option<String>,

    /// Override target database
    pub graph_database: Option<String>,

    /// Override record file directory
    pub output_dir: Option<PathBuf>,

    /// Override extract directory
    pub export_dir: Option<PathBuf>,

    /// Override online batch size
    pub load_batch_size: Option<usize>,

    /// Override transformer chunk size
    pub transform_chunk_size: Option<usize>,

    /// Override log level
    pub log_level: Option<String>,
}

impl VocabConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref uri) = overrides.graph_uri {
            self.graph.uri = uri.clone();
        }

        if let Some(ref database) = overrides.graph_database {
            self.graph.database = database.clone();
        }

        if let Some(ref dir) = overrides.output_dir {
            self.paths.output_dir = dir.clone();
        }

        if let Some(ref dir) = overrides.export_dir {
            self.paths.export_dir = dir.clone();
        }

        if let Some(size) = overrides.load_batch_size {
            self.tuning.load_batch_size = size;
        }

        if let Some(size) = overrides.transform_chunk_size {
            self.tuning.transform_chunk_size = size;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tuning.load_batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "tuning.load_batch_size",
                "must be greater than 0",
            ));
        }
        if self.tuning.transform_chunk_size == 0 {
            return Err(ConfigError::invalid_value(
                "tuning.transform_chunk_size",
                "must be greater than 0",
            ));
        }
        if self.graph.database.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "graph.database",
                "must not be empty",
            ));
        }
        if self.graph.import_uri_prefix.is_empty() {
            return Err(ConfigError::invalid_value(
                "graph.import_uri_prefix",
                "must not be empty",
            ));
        }
        if !SQL_IDENTIFIER.is_match(&self.source.schema) {
            return Err(ConfigError::invalid_value(
                "source.schema",
                format!("'{}' is not a plain SQL identifier", self.source.schema),
            ));
        }
        Ok(())
    }
}
