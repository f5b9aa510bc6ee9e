//! CLI command implementations
//!
//! This module contains all VocabGraph CLI command implementations.

pub mod clear;
pub mod config;
pub mod create_schema;
pub mod extract;
pub mod load;
pub mod prepare_bulk;
pub mod transform;
pub mod validate;

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use vocabgraph_config::{ConfigLoader, VocabConfig};
use vocabgraph_core::TransformConfig;
use vocabgraph_store::{Neo4jSettings, Neo4jStore, Validator};

use crate::GlobalOptions;

/// Load configuration: global, then local, then `--config`, then CLI overrides.
pub fn load_config(global: &GlobalOptions) -> Result<VocabConfig> {
    let work_dir = std::env::current_dir().context("Failed to get current directory")?;
    let overrides = global.to_config_overrides();

    ConfigLoader::new()
        .load(&work_dir, global.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")
}

/// Neo4j connection settings, with the password read from the configured variable.
pub fn neo4j_settings(config: &VocabConfig) -> Neo4jSettings {
    let password = std::env::var(&config.graph.password_env).unwrap_or_default();

    Neo4jSettings::new(config.graph.uri.clone())
        .with_credentials(config.graph.user.clone(), password)
        .with_database(config.graph.database.clone())
        .with_pool(config.graph.max_connections, config.graph.fetch_size)
}

/// Connect to the configured Neo4j server.
pub async fn connect_graph(config: &VocabConfig) -> Result<Neo4jStore> {
    Neo4jStore::connect(&neo4j_settings(config))
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.graph.uri))
}

/// Transformer settings for the online layout.
pub fn transform_config(config: &VocabConfig) -> TransformConfig {
    TransformConfig::new(&config.paths.export_dir, &config.paths.output_dir)
        .with_chunk_size(config.tuning.transform_chunk_size)
}

/// Validator with the configured probe limits.
pub fn validator<'a, S>(store: &'a S, config: &VocabConfig) -> Validator<'a, S>
where
    S: vocabgraph_store::GraphStore + ?Sized,
{
    Validator::new(store).with_limits(
        config.validation.neighbor_sample,
        config.validation.relationship_group_limit,
    )
}

/// Ask a yes/no question on stdin. Anything but `y` declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!("warning: {}", message);
}
