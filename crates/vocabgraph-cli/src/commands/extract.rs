//! Extract command - Export vocabulary tables from PostgreSQL
//!
//! Streams `COPY (...) TO STDOUT` for each table into a CSV file under the
//! export directory. A table that fails leaves no file behind.

use anyhow::{Context, Result};
use clap::Args;
use futures::StreamExt;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, info};
use vocabgraph_config::{SourceConfig, VocabConfig};
use vocabgraph_core::{ExtractError, ExtractFileWriter, ExtractTable};

use super::{print_info, print_json};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// One exported table.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedFile {
    pub file: String,
    pub bytes: u64,
}

fn connect_options(source: &SourceConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&source.host)
        .port(source.port)
        .username(&source.user)
        .database(&source.database);

    match std::env::var(&source.password_env) {
        Ok(password) => options.password(&password),
        Err(_) => options,
    }
}

/// Stream one table into its extract file.
async fn export_table(
    conn: &mut PgConnection,
    table: ExtractTable,
    schema: &str,
    config: &VocabConfig,
) -> Result<u64, ExtractError> {
    let statement = table.copy_statement(schema)?;
    let path = config.paths.export_dir.join(table.file_name());
    debug!("Running {}", statement);

    let mut writer = ExtractFileWriter::create(&path)?;
    let mut stream = conn
        .copy_out_raw(&statement)
        .await
        .map_err(|e| ExtractError::query(table.file_name(), e))?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ExtractError::query(table.file_name(), e))?;
        writer.write_chunk(&chunk)?;
    }
    // Writer removes the partial file if anything above failed
    writer.finish()
}

/// Execute the extract command
pub async fn execute(args: ExtractArgs, global: GlobalOptions, config: VocabConfig) -> Result<()> {
    let source = &config.source;
    info!(
        "Connecting to PostgreSQL at {}:{} (database: {}, schema: {})",
        source.host, source.port, source.database, source.schema
    );
    let mut conn = PgConnection::connect_with(&connect_options(source))
        .await
        .map_err(ExtractError::connection)
        .with_context(|| format!("Failed to connect to {}", source.url()))?;

    let mut extracted = Vec::new();
    for table in ExtractTable::ALL {
        let pb = spinner(&format!("Exporting {}...", table.file_name()), global.quiet);
        let bytes = export_table(&mut conn, table, &source.schema, &config)
            .await
            .with_context(|| format!("Failed to export {}", table.file_name()))?;
        finish_spinner(pb, &format!("Exported {} ({} bytes)", table.file_name(), bytes));
        extracted.push(ExtractedFile {
            file: table.file_name().to_string(),
            bytes,
        });
    }

    conn.close().await.ok();

    if args.json {
        print_json(&extracted)?;
    } else {
        print_info(
            &format!(
                "Extracted {} tables to {}",
                extracted.len(),
                config.paths.export_dir.display()
            ),
            global.quiet,
        );
    }
    Ok(())
}
