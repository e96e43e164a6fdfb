use anyhow::Result;
use clap::Parser;
use code_docu::cli::{run, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let command = match &cli.command {
        Commands::Ingest { .. } => "ingest",
        Commands::Analyze { .. } => "analyze",
        Commands::Run { .. } => "run",
        Commands::Status { .. } => "status",
    };
    tracing::info!(
        command,
        config = ?cli.config,
        "CLI arguments parsed, invoking run"
    );
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!(command, "CLI completed successfully"),
        Err(e) => tracing::error!(command, error = %e, "CLI exited with error"),
    }
    result
}
