//! VocabGraph CLI - OMOP vocabulary tables to a Neo4j property graph
//!
//! A command-line interface for extracting vocabulary tables, transforming
//! them into graph record files, and loading them into Neo4j.
//!
//! # Usage
//!
//! ```bash
//! # Export the vocabulary tables from PostgreSQL
//! vocabgraph extract
//!
//! # Transform and load into a running Neo4j (clears the database first)
//! vocabgraph load --yes
//!
//! # Prepare files for the offline bulk importer
//! vocabgraph prepare-bulk
//!
//! # Inspect the loaded graph
//! vocabgraph validate --concept-id 1177480
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vocabgraph_config::{ConfigOverrides, LogFormat, LoggingConfig};

mod commands;
mod progress;

/// VocabGraph - OMOP vocabularies as a labeled property graph
#[derive(Parser, Debug)]
#[command(name = "vocabgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "VOCABGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Neo4j Bolt URI
    #[arg(long, global = true, env = "VOCABGRAPH_NEO4J_URI")]
    neo4j_uri: Option<String>,

    /// Neo4j database name
    #[arg(long, global = true, env = "VOCABGRAPH_DATABASE")]
    database: Option<String>,

    /// Rows per committed load batch
    #[arg(long, global = true, env = "VOCABGRAPH_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Rows per transformer chunk
    #[arg(long, global = true, env = "VOCABGRAPH_CHUNK_SIZE")]
    chunk_size: Option<usize>,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        ConfigOverrides {
            graph_uri: self.neo4j_uri.clone(),
            graph_database: self.database.clone(),
            load_batch_size: self.batch_size,
            transform_chunk_size: self.chunk_size,
            log_level,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the vocabulary tables from PostgreSQL to CSV files
    Extract(commands::extract::ExtractArgs),

    /// Transform extract files into graph record files
    Transform(commands::transform::TransformArgs),

    /// Full online reload into Neo4j (clear, schema, load, validate)
    Load(commands::load::LoadArgs),

    /// Write header/data file pairs and the neo4j-admin import command
    PrepareBulk(commands::prepare_bulk::PrepareBulkArgs),

    /// Create the uniqueness constraints and lookup indexes
    CreateSchema(commands::create_schema::CreateSchemaArgs),

    /// Report label and relationship counts and probe one concept
    Validate(commands::validate::ValidateArgs),

    /// Drop all constraints and indexes and delete all data
    Clear(commands::clear::ClearArgs),

    /// Inspect and initialize configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the global subscriber from the logging section.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&logging.level)
        .with_context(|| format!("Invalid log level '{}'", logging.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match &logging.file {
        None => match logging.format {
            LogFormat::Text => Box::new(
                builder
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .finish(),
            ),
            LogFormat::Json => Box::new(builder.json().with_writer(std::io::stderr).finish()),
        },
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            match logging.format {
                LogFormat::Text => Box::new(
                    builder
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .finish(),
                ),
                LogFormat::Json => Box::new(builder.json().with_writer(Mutex::new(file)).finish()),
            }
        }
    };

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.global)?;
    init_tracing(&config.logging)?;

    // Execute the command
    match cli.command {
        Commands::Extract(args) => commands::extract::execute(args, cli.global, config).await,
        Commands::Transform(args) => commands::transform::execute(args, cli.global, config).await,
        Commands::Load(args) => commands::load::execute(args, cli.global, config).await,
        Commands::PrepareBulk(args) => {
            commands::prepare_bulk::execute(args, cli.global, config).await
        }
        Commands::CreateSchema(args) => {
            commands::create_schema::execute(args, cli.global, config).await
        }
        Commands::Validate(args) => commands::validate::execute(args, cli.global, config).await,
        Commands::Clear(args) => commands::clear::execute(args, cli.global, config).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global, config).await,
    }
}
