//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.vocabgraph/config.toml`
//! 2. Local config: `.vocabgraph/config.toml` (in the working directory)
//! 3. Explicit config file (`--config`)
//! 4. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, GraphConfig, LoggingConfig, PathsConfig, SourceConfig, TuningConfig,
    ValidationConfig, VocabConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".vocabgraph";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".vocabgraph";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.vocabgraph`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<VocabConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.vocabgraph`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration with an optional explicit file and CLI overrides.
    ///
    /// Merges config in order: global → local → explicit → overrides, then
    /// validates the result.
    pub fn load(
        &mut self,
        work_dir: &Path,
        explicit: Option<&Path>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<VocabConfig, ConfigError> {
        let mut config = VocabConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(work_dir)? {
            config = merge_configs(config, local_config);
        }

        if let Some(path) = explicit {
            debug!("Loading explicit config from {:?}", path);
            config = merge_configs(config, load_config_file(path)?);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<VocabConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a working directory.
    pub fn load_local(&self, work_dir: &Path) -> Result<Option<VocabConfig>, ConfigError> {
        let local_path = self.local_config_path(work_dir);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Write a default configuration to the local config file.
    ///
    /// Leaves an existing file untouched and returns its path.
    pub fn init_local(&self, work_dir: &Path) -> Result<PathBuf, ConfigError> {
        let local_path = self.local_config_path(work_dir);
        if !local_path.exists() {
            save_config_file(&local_path, &VocabConfig::default())?;
        }
        Ok(local_path)
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<VocabConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &VocabConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Pick `overlay` when it differs from the default, otherwise keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// This performs a field-by-field merge, allowing partial configs.
fn merge_configs(base: VocabConfig, overlay: VocabConfig) -> VocabConfig {
    VocabConfig {
        paths: merge_paths(base.paths, overlay.paths),
        source: merge_source(base.source, overlay.source),
        graph: merge_graph(base.graph, overlay.graph),
        tuning: merge_tuning(base.tuning, overlay.tuning),
        validation: merge_validation(base.validation, overlay.validation),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_paths(base: PathsConfig, overlay: PathsConfig) -> PathsConfig {
    let d = PathsConfig::default();
    PathsConfig {
        export_dir: pick(base.export_dir, overlay.export_dir, d.export_dir),
        output_dir: pick(base.output_dir, overlay.output_dir, d.output_dir),
        bulk_dir: pick(base.bulk_dir, overlay.bulk_dir, d.bulk_dir),
    }
}

fn merge_source(base: SourceConfig, overlay: SourceConfig) -> SourceConfig {
    let d = SourceConfig::default();
    SourceConfig {
        host: pick(base.host, overlay.host, d.host),
        port: pick(base.port, overlay.port, d.port),
        user: pick(base.user, overlay.user, d.user),
        password_env: pick(base.password_env, overlay.password_env, d.password_env),
        database: pick(base.database, overlay.database, d.database),
        schema: pick(base.schema, overlay.schema, d.schema),
    }
}

fn merge_graph(base: GraphConfig, overlay: GraphConfig) -> GraphConfig {
    let d = GraphConfig::default();
    GraphConfig {
        uri: pick(base.uri, overlay.uri, d.uri),
        user: pick(base.user, overlay.user, d.user),
        password_env: pick(base.password_env, overlay.password_env, d.password_env),
        database: pick(base.database, overlay.database, d.database),
        import_uri_prefix: pick(
            base.import_uri_prefix,
            overlay.import_uri_prefix,
            d.import_uri_prefix,
        ),
        max_connections: pick(base.max_connections, overlay.max_connections, d.max_connections),
        fetch_size: pick(base.fetch_size, overlay.fetch_size, d.fetch_size),
    }
}

fn merge_tuning(base: TuningConfig, overlay: TuningConfig) -> TuningConfig {
    let d = TuningConfig::default();
    TuningConfig {
        load_batch_size: pick(base.load_batch_size, overlay.load_batch_size, d.load_batch_size),
        transform_chunk_size: pick(
            base.transform_chunk_size,
            overlay.transform_chunk_size,
            d.transform_chunk_size,
        ),
    }
}

fn merge_validation(base: ValidationConfig, overlay: ValidationConfig) -> ValidationConfig {
    let d = ValidationConfig::default();
    ValidationConfig {
        sample_concept_id: pick(
            base.sample_concept_id,
            overlay.sample_concept_id,
            d.sample_concept_id,
        ),
        neighbor_sample: pick(base.neighbor_sample, overlay.neighbor_sample, d.neighbor_sample),
        relationship_group_limit: pick(
            base.relationship_group_limit,
            overlay.relationship_group_limit,
            d.relationship_group_limit,
        ),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let d = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, d.level),
        format: pick(base.format, overlay.format, d.format),
        file: overlay.file.or(base.file),
    }
}
