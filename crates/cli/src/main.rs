//! studymate CLI: the main entry point.
//!
//! Commands:
//! - `bootstrap`: Create or reuse the assistant and ingest a document
//! - `ask`: Interactive Q&A with citations
//! - `notes`: Generate validated exam notes
//! - `check`: Validate a previously written notes file
//! - `teardown`: Delete the assistant and forget its ID
//! - `status`: Show resolved configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "studymate",
    about = "studymate: study Q&A and exam notes over your own documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or reuse the assistant and ingest a study document
    Bootstrap {
        /// Document to ingest (defaults to `paths.document` in the config)
        document: Option<PathBuf>,
    },

    /// Ask questions about the ingested material
    Ask,

    /// Generate exam notes and save them
    Notes,

    /// Validate a notes file written earlier
    Check {
        /// Notes file (defaults to `paths.notes_file` in the config)
        path: Option<PathBuf>,
    },

    /// Delete the assistant and remove the local ID file
    Teardown,

    /// Show resolved configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Bootstrap { document } => commands::bootstrap::run(document).await?,
        Commands::Ask => commands::ask::run().await?,
        Commands::Notes => commands::notes::run().await?,
        Commands::Check { path } => commands::check::run(path).await?,
        Commands::Teardown => commands::teardown::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
