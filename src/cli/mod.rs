pub mod process;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Registry certificate OCR pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "deed-ocr")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Extract registry certificate fields from scanned documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a document, or every document in a directory
    Process(process::ProcessArgs),

    /// Check that the recognition and extraction services are reachable
    Check(process::CheckArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    tracing::info!("{}", crate::version::get_version_string());
    match cli.command {
        Commands::Process(args) => process::process(args).await,
        Commands::Check(args) => process::check(args).await,
    }
}
