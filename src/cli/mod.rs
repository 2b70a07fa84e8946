//! Command-line interface for blobpath.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::adapter::{AdapterError, PathAdapter};
use crate::app::{App, AppError};
use crate::blob_client::BlobClient;

pub use args::{GlobalArgs, InputSource, OutputSink};
use commands::path::{AuditArgs, ExistsArgs, GetArgs, PutArgs, RmArgs, StatArgs, UrlArgs};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// App error.
    #[error("{0}")]
    App(#[from] AppError),

    /// Path adapter error.
    #[error("{0}")]
    Adapter(#[from] AdapterError),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// bpath - Path-addressed access to a flat blob store.
#[derive(Parser, Debug)]
#[command(name = "bpath", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store content at a path, replacing any previous content.
    Put(PutArgs),

    /// Read the content stored at a path.
    Get(GetArgs),

    /// Delete a path and its blob.
    Rm(RmArgs),

    /// Check whether a path exists.
    Exists(ExistsArgs),

    /// Show the recorded metadata for a path.
    Stat(StatArgs),

    /// Print the retrievable URL for a path.
    Url(UrlArgs),

    /// Compare a path's mapping with the blob store.
    Audit(AuditArgs),
}

impl Command {
    /// Run the command against the given adapter.
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        match self {
            Command::Put(args) => args.run(adapter, global).await,
            Command::Get(args) => args.run(adapter).await,
            Command::Rm(args) => args.run(adapter).await,
            Command::Exists(args) => args.run(adapter, global).await,
            Command::Stat(args) => args.run(adapter, global).await,
            Command::Url(args) => args.run(adapter, global).await,
            Command::Audit(args) => args.run(adapter, global).await,
        }
    }
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let app = App::new(self.global.to_app_context())?;
        for warning in app.warnings() {
            tracing::warn!("{}", warning);
        }

        let adapter = app.create_adapter()?;
        self.command.run(&adapter, &self.global).await
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}
