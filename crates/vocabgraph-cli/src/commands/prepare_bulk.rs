//! Prepare-bulk command - Files and command for the offline importer
//!
//! Writes header/data file pairs into the bulk directory and prints the
//! `neo4j-admin database import full` command. The command is never run
//! here; the server must be stopped first.

use anyhow::{Context, Result};
use clap::Args;
use vocabgraph_config::VocabConfig;
use vocabgraph_core::{BulkPreparer, TransformConfig};

use super::{print_info, print_json};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the prepare-bulk command
#[derive(Args, Debug)]
pub struct PrepareBulkArgs {
    /// Output the plan as JSON instead of the operator checklist
    #[arg(long)]
    json: bool,
}

/// Execute the prepare-bulk command
pub async fn execute(
    args: PrepareBulkArgs,
    global: GlobalOptions,
    config: VocabConfig,
) -> Result<()> {
    let pb = spinner(
        &format!(
            "Writing bulk import files to {}...",
            config.paths.bulk_dir.display()
        ),
        global.quiet,
    );
    let preparer = BulkPreparer::new(
        TransformConfig::new(&config.paths.export_dir, &config.paths.bulk_dir)
            .with_chunk_size(config.tuning.transform_chunk_size),
        config.graph.database.clone(),
    );
    let plan = preparer.prepare().context("Bulk preparation failed")?;
    finish_spinner(
        pb,
        &format!(
            "Wrote {} node and {} relationship file pairs",
            plan.nodes.len(),
            plan.relationships.len()
        ),
    );

    if args.json {
        return print_json(&plan);
    }

    print_info("", global.quiet);
    print_info("Bulk import checklist:", global.quiet);
    print_info(
        &format!(
            "  1. Stop the Neo4j server; the import replaces database '{}'",
            config.graph.database
        ),
        global.quiet,
    );
    print_info("  2. Run the command below on the server host", global.quiet);
    print_info("  3. Start the Neo4j server", global.quiet);
    print_info(
        "  4. Run `vocabgraph create-schema`; bulk import skips uniqueness checks",
        global.quiet,
    );
    print_info("", global.quiet);
    println!("{}", plan.render());
    Ok(())
}
