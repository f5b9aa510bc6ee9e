//! Config command - Inspect and initialize configuration
//!
//! - Show the effective (merged) configuration
//! - Get one value by dotted key
//! - Show configuration file paths
//! - Write a default local config file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use vocabgraph_config::{ConfigLoader, VocabConfig};

use super::print_json;
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Get a specific configuration value
    Get(GetArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Write a default .vocabgraph/config.toml in the current directory
    Init,
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Configuration key (e.g., "graph.uri")
    key: String,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Explicit config file, if one was given
    pub explicit: Option<PathBuf>,
    pub global_exists: bool,
    pub local_exists: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions, config: VocabConfig) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, &config),
        ConfigCommand::Get(args) => execute_get(args, &config),
        ConfigCommand::Path(args) => execute_path(args, &global),
        ConfigCommand::Init => execute_init(),
    }
}

fn execute_show(args: ShowArgs, config: &VocabConfig) -> Result<()> {
    if args.json {
        return print_json(config);
    }
    let json = serde_json::to_value(config)?;
    for (key, value) in flatten("", &json) {
        println!("{} = {}", key, value);
    }
    Ok(())
}

fn execute_get(args: GetArgs, config: &VocabConfig) -> Result<()> {
    let value = get_config_value(config, &args.key)
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", args.key))?;

    match value {
        serde_json::Value::String(s) => println!("{}", s),
        serde_json::Value::Null => println!("null"),
        other => println!("{}", other),
    }
    Ok(())
}

fn execute_path(args: PathArgs, global: &GlobalOptions) -> Result<()> {
    let work_dir = std::env::current_dir().context("Failed to get current directory")?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&work_dir);
    let paths = ConfigPaths {
        global_exists: global_path.as_ref().map(|p| p.exists()).unwrap_or(false),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
        explicit: global.config.clone(),
    };

    if args.json {
        return print_json(&paths);
    }

    let status = |exists: bool| if exists { "exists" } else { "not found" };
    match &paths.global {
        Some(path) => println!("Global:   {} ({})", path.display(), status(paths.global_exists)),
        None => println!("Global:   not available (no home directory)"),
    }
    println!(
        "Local:    {} ({})",
        paths.local.display(),
        status(paths.local_exists)
    );
    if let Some(path) = &paths.explicit {
        println!("Explicit: {} ({})", path.display(), status(path.exists()));
    }
    Ok(())
}

fn execute_init() -> Result<()> {
    let work_dir = std::env::current_dir().context("Failed to get current directory")?;
    let path = ConfigLoader::new()
        .init_local(&work_dir)
        .context("Failed to write local config")?;
    println!("Local config at {}", path.display());
    Ok(())
}

/// Get a configuration value by dotted key path.
fn get_config_value(config: &VocabConfig, key: &str) -> Option<serde_json::Value> {
    let json = serde_json::to_value(config).ok()?;
    let mut current = &json;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current.clone())
}

/// Leaf values keyed by dotted path, in document order.
fn flatten(prefix: &str, value: &serde_json::Value) -> Vec<(String, serde_json::Value)> {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .flat_map(|(key, child)| {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child)
            })
            .collect(),
        leaf => vec![(prefix.to_string(), leaf.clone())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_value() {
        let config = VocabConfig::default();
        assert_eq!(
            get_config_value(&config, "graph.uri"),
            Some(serde_json::json!("bolt://localhost:7687"))
        );
        assert_eq!(
            get_config_value(&config, "tuning.load_batch_size"),
            Some(serde_json::json!(10_000))
        );
        assert_eq!(get_config_value(&config, "graph.nope"), None);
    }

    #[test]
    fn test_flatten_reaches_every_section() {
        let json = serde_json::to_value(VocabConfig::default()).unwrap();
        let keys: Vec<String> = flatten("", &json).into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"paths.export_dir".to_string()));
        assert!(keys.contains(&"validation.sample_concept_id".to_string()));
        assert!(keys.contains(&"logging.file".to_string()));
    }
}
