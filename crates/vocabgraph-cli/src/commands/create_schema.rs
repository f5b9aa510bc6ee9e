//! Create-schema command - Constraints and lookup indexes
//!
//! Safe to run repeatedly. Required after a bulk import.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use vocabgraph_config::VocabConfig;
use vocabgraph_store::{create_schema, REQUIRED_SCHEMA};

use super::{connect_graph, print_info, print_json};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the create-schema command
#[derive(Args, Debug)]
pub struct CreateSchemaArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SchemaEntry {
    name: &'static str,
    kind: String,
    statement: String,
}

/// Execute the create-schema command
pub async fn execute(
    args: CreateSchemaArgs,
    global: GlobalOptions,
    config: VocabConfig,
) -> Result<()> {
    let store = connect_graph(&config).await?;

    let pb = spinner("Creating constraints and indexes...", global.quiet);
    let created = create_schema(&store)
        .await
        .context("Failed to create schema")?;
    finish_spinner(pb, &format!("Ensured {} schema objects", created));

    let entries: Vec<SchemaEntry> = REQUIRED_SCHEMA
        .iter()
        .map(|d| SchemaEntry {
            name: d.name,
            kind: d.kind.to_string(),
            statement: d.create_statement(),
        })
        .collect();

    if args.json {
        return print_json(&entries);
    }
    for entry in &entries {
        print_info(&format!("  {:<11} {}", entry.kind, entry.name), global.quiet);
    }
    Ok(())
}
