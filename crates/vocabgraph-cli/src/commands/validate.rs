//! Validate command - Counts and a concept probe
//!
//! Read-only. Differences from what was expected show up in the report;
//! only connection and query failures make the command fail.

use anyhow::{Context, Result};
use clap::Args;
use vocabgraph_config::VocabConfig;

use super::{connect_graph, print_json, validator};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Concept to probe (defaults to the configured sample concept)
    #[arg(long)]
    concept_id: Option<i64>,

    /// Only report counts
    #[arg(long, conflicts_with = "concept_id")]
    no_probe: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the validate command
pub async fn execute(args: ValidateArgs, global: GlobalOptions, config: VocabConfig) -> Result<()> {
    let store = connect_graph(&config).await?;

    let concept_id = if args.no_probe {
        None
    } else {
        Some(args.concept_id.unwrap_or(config.validation.sample_concept_id))
    };

    let pb = spinner("Collecting graph statistics...", global.quiet);
    let report = validator(&store, &config)
        .run(concept_id)
        .await
        .context("Validation failed")?;
    finish_spinner(
        pb,
        &format!(
            "{} nodes, {} relationships",
            report.total_nodes(),
            report.total_relationships()
        ),
    );

    if args.json {
        print_json(&report)
    } else {
        println!("{}", report);
        Ok(())
    }
}
