//! Clear command - Reset the destination graph
//!
//! Drops every constraint and droppable index, then deletes all nodes and
//! relationships in batches. Interrupting it leaves a partial state; run it
//! again to finish.

use anyhow::{Context, Result};
use clap::Args;
use vocabgraph_config::VocabConfig;
use vocabgraph_store::clear_graph;

use super::{confirm, connect_graph, print_info, print_json};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the clear command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the clear command
pub async fn execute(args: ClearArgs, global: GlobalOptions, config: VocabConfig) -> Result<()> {
    if !args.yes {
        println!(
            "This deletes every node, relationship, constraint and index in '{}' at {}.",
            config.graph.database, config.graph.uri
        );
        if !confirm("Proceed with clearing?")? {
            if args.json {
                print_json(&serde_json::json!({"cancelled": true}))?;
            } else {
                println!("Clear cancelled.");
            }
            return Ok(());
        }
    }

    let store = connect_graph(&config).await?;

    let pb = spinner("Clearing graph...", global.quiet);
    let report = clear_graph(&store, config.tuning.load_batch_size)
        .await
        .context("Failed to clear the graph")?;
    finish_spinner(pb, "Graph cleared");

    if args.json {
        return print_json(&report);
    }
    print_info(
        &format!(
            "Dropped {} constraints and {} indexes; deleted all data",
            report.constraints_dropped, report.indexes_dropped
        ),
        global.quiet,
    );
    Ok(())
}
