///
/// This module implements the CLI interface for code-docu: command parsing, argument
/// validation, and user-visible invocations.
///
/// All pipeline logic (collection, generation, persistence, packaging) lives in the
/// [`code-docu-core`] crate. This module is CLI glue: it loads configuration, builds
/// the concrete collaborators and hands them to the core.
///
/// ## How To Use
/// - For command-line users: use the installed `code-docu` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`code-docu-core`]: ../../code-docu-core/
use crate::analyze::analyze;
use crate::generate::OpenAiClient;
use crate::ingest::ingest;
use crate::load_config::{load_or_default, CliConfig};
use crate::records::RecordStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use code_docu_core::contract::TextGenerator;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for code-docu: document a zipped source tree with a text-generation service.
#[derive(Parser)]
#[clap(
    name = "code-docu",
    version,
    about = "Download a ZIP of source code and generate Markdown documentation for it"
)]
pub struct Cli {
    /// Path to the YAML config file (built-in defaults when omitted)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and extract a ZIP archive, registering a new run
    Ingest {
        /// URL of the ZIP archive
        #[clap(long)]
        url: String,
    },
    /// Generate documentation for a previously ingested run
    Analyze {
        /// Run identifier printed by `ingest`
        #[clap(long)]
        id: String,
    },
    /// Ingest an archive and analyze it straight away
    Run {
        /// URL of the ZIP archive
        #[clap(long)]
        url: String,
    },
    /// Show whether a run has been analyzed
    Status {
        /// Run identifier printed by `ingest`
        #[clap(long)]
        id: String,
    },
}

fn build_generator(config: &CliConfig) -> Result<Arc<dyn TextGenerator>> {
    Ok(Arc::new(OpenAiClient::from_config(&config.generator)?))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_or_default(cli.config.as_deref())?;
    let records = RecordStore::open(&config.storage.database).await?;

    match cli.command {
        Commands::Ingest { url } => {
            tracing::info!(command = "ingest", url = %url, "Starting ingestion");
            let client = reqwest::Client::new();
            let report = ingest(&client, &config.storage, &records, &url).await?;
            println!("Ingested run {}", report.run_id);
            println!("  archive:   {}", report.zip_path.display());
            println!("  extracted: {}", report.unzip_dir.display());
            println!("  sha256:    {}", report.sha256);
        }
        Commands::Analyze { id } => {
            tracing::info!(command = "analyze", run_id = %id, "Starting analysis");
            let generator = build_generator(&config)?;
            let report = analyze(&config, &records, generator, &id).await?;
            println!("Analyzed run {id}: {} files documented", report.items_collected);
            println!("  documentation: {}", report.docs_dir.display());
            println!("  archive:       {}", report.archive_path.display());
        }
        Commands::Run { url } => {
            tracing::info!(command = "run", url = %url, "Starting ingestion and analysis");
            let generator = build_generator(&config)?;
            let client = reqwest::Client::new();
            let ingested = ingest(&client, &config.storage, &records, &url).await?;
            let report = analyze(&config, &records, generator, &ingested.run_id).await?;
            println!(
                "Analyzed run {}: {} files documented",
                ingested.run_id, report.items_collected
            );
            println!("  archive: {}", report.archive_path.display());
        }
        Commands::Status { id } => {
            tracing::info!(command = "status", run_id = %id, "Looking up run");
            let record = records
                .get(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Run {id} not found"))?;
            let status = if record.analyzed { "analyzed" } else { "pending" };
            println!("Run {}: {status} (created at {})", record.id, record.created_at);
        }
    }

    Ok(())
}
