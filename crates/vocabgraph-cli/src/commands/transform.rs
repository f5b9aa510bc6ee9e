//! Transform command - Extract files to graph record files

use anyhow::{Context, Result};
use clap::Args;
use vocabgraph_config::VocabConfig;
use vocabgraph_core::{TransformSummary, Transformer};

use super::{print_info, print_json, transform_config};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Run the transformer with a spinner. Shared with `load`.
pub fn run_transform(config: &VocabConfig, quiet: bool) -> Result<TransformSummary> {
    let pb = spinner(
        &format!(
            "Transforming {} into {}...",
            config.paths.export_dir.display(),
            config.paths.output_dir.display()
        ),
        quiet,
    );
    let summary = Transformer::new(transform_config(config))
        .run()
        .context("Transformation failed")?;
    finish_spinner(
        pb,
        &format!(
            "Wrote {} record files in {}ms",
            summary.outputs.len(),
            summary.elapsed_ms
        ),
    );
    Ok(summary)
}

/// Print one line per record file.
pub fn print_summary(summary: &TransformSummary, quiet: bool) {
    for output in &summary.outputs {
        print_info(
            &format!("  {:<24} {:>12} rows", output.file.file_name(), output.rows),
            quiet,
        );
    }
}

/// Execute the transform command
pub async fn execute(
    args: TransformArgs,
    global: GlobalOptions,
    config: VocabConfig,
) -> Result<()> {
    let summary = run_transform(&config, global.quiet)?;

    if args.json {
        print_json(&summary)?;
    } else {
        print_summary(&summary, global.quiet);
    }
    Ok(())
}
