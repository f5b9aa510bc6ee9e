//! Load command - Full online reload
//!
//! Transforms the extract files (unless `--skip-transform`), clears the
//! destination (unless `--no-clear`), creates the schema, loads every record
//! file in committed batches, then prints a validation report.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use vocabgraph_config::VocabConfig;
use vocabgraph_core::TransformSummary;
use vocabgraph_store::{
    GraphStore, LoadReport, LoadSettings, MemoryGraph, OnlineLoader, ValidationReport,
};

use super::transform::{print_summary, run_transform};
use super::{confirm, connect_graph, print_info, print_json, print_warning, validator};
use crate::progress::{finish_spinner, finish_spinner_error, spinner};
use crate::GlobalOptions;

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Keep existing data and schema (loads upsert, so reruns converge)
    #[arg(long)]
    no_clear: bool,

    /// Use the record files already in the output directory
    #[arg(long)]
    skip_transform: bool,

    /// Load into an in-memory graph instead of Neo4j
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// Skip the validation report after loading
    #[arg(long)]
    no_validate: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Result of the load command
#[derive(Debug, Serialize)]
pub struct LoadResult {
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSummary>,
    pub load: LoadReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

fn load_settings(config: &VocabConfig, no_clear: bool) -> LoadSettings {
    LoadSettings::new(&config.paths.output_dir)
        .with_import_uri_prefix(config.graph.import_uri_prefix.clone())
        .with_batch_size(config.tuning.load_batch_size)
        .with_skip_clear(no_clear)
}

/// Run the loader and the optional validation against any store.
async fn load_into<S>(
    store: &S,
    args: &LoadArgs,
    config: &VocabConfig,
    quiet: bool,
) -> Result<(LoadReport, Option<ValidationReport>)>
where
    S: GraphStore + ?Sized,
{
    let pb = spinner(&format!("Loading into {}...", store.name()), quiet);
    let mut loader = OnlineLoader::new(store, load_settings(config, args.no_clear));
    let result = loader
        .run_with(|stage| {
            if let Some(pb) = &pb {
                pb.set_message(format!("Loading into {} ({})...", store.name(), stage));
            }
        })
        .await;
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            finish_spinner_error(pb, &format!("Load stopped at {}", loader.stage()));
            return Err(err)
                .context("Online load failed; clear the graph and run a full load again");
        }
    };
    finish_spinner(
        pb,
        &format!(
            "Loaded {} rows in {}ms",
            report.rows_loaded(),
            report.elapsed_ms
        ),
    );

    let validation = if args.no_validate {
        None
    } else {
        let report = validator(store, config)
            .run(Some(config.validation.sample_concept_id))
            .await
            .context("Validation failed")?;
        Some(report)
    };

    Ok((report, validation))
}

/// Execute the load command
pub async fn execute(args: LoadArgs, global: GlobalOptions, config: VocabConfig) -> Result<()> {
    let destructive = !args.no_clear && !args.dry_run;
    if destructive && !args.yes {
        println!(
            "This deletes every node, relationship, constraint and index in '{}' at {}.",
            config.graph.database, config.graph.uri
        );
        if !confirm("Proceed with full reload?")? {
            if args.json {
                print_json(&serde_json::json!({"cancelled": true}))?;
            } else {
                println!("Load cancelled.");
            }
            return Ok(());
        }
    }

    if args.no_clear && !args.dry_run {
        print_warning("existing data is kept; rows merge into it by identifier");
    }

    let transform = if args.skip_transform {
        None
    } else {
        Some(run_transform(&config, global.quiet)?)
    };

    let (load, validation) = if args.dry_run {
        let store = MemoryGraph::new();
        load_into(&store, &args, &config, global.quiet).await?
    } else {
        let store = connect_graph(&config).await?;
        load_into(&store, &args, &config, global.quiet).await?
    };

    let result = LoadResult {
        dry_run: args.dry_run,
        transform,
        load,
        validation,
    };

    if args.json {
        return print_json(&result);
    }

    if let Some(summary) = &result.transform {
        print_summary(summary, global.quiet);
    }
    for stage in &result.load.stages {
        let status = if stage.skipped { "skipped" } else { "ok" };
        print_info(
            &format!(
                "  {:<22} {:>8} {:>12} rows {:>8}ms",
                stage.stage.as_str(),
                status,
                stage.rows,
                stage.elapsed_ms
            ),
            global.quiet,
        );
    }
    if let Some(validation) = &result.validation {
        println!("{}", validation);
    }
    Ok(())
}
