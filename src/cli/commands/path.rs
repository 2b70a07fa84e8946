//! Path subcommands.
//!
//! Each command runs one adapter operation and renders its result either as
//! plain text or, with `--json`, as pretty-printed JSON.

use clap::Args;
use serde_json::json;

use crate::adapter::{DriftStatus, PathAdapter};
use crate::blob_client::BlobClient;
use crate::cli::{GlobalArgs, InputSource, OutputSink, Result};

// =============================================================================
// Put
// =============================================================================

/// Arguments for the put command.
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Logical path to store the content under.
    pub path: String,

    #[command(flatten)]
    pub input: InputSource,

    #[command(flatten)]
    pub output: OutputSink,
}

impl PutArgs {
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        let contents = self.input.read_bytes().await?;
        let result = adapter.write(&self.path, contents).await?;

        if global.json {
            self.output.write_json(&result).await?;
        } else {
            self.output
                .write_str(&format!("{} {} {}", result.fid, result.size, result.url))
                .await?;
        }
        Ok(())
    }
}

// =============================================================================
// Get
// =============================================================================

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Logical path to read.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl GetArgs {
    pub async fn run<B: BlobClient>(self, adapter: &PathAdapter<B>) -> Result<()> {
        let contents = adapter.read(&self.path).await?;
        self.output.write_bytes(&contents).await?;
        Ok(())
    }
}

// =============================================================================
// Rm
// =============================================================================

/// Arguments for the rm command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Logical path to delete.
    pub path: String,
}

impl RmArgs {
    pub async fn run<B: BlobClient>(self, adapter: &PathAdapter<B>) -> Result<()> {
        adapter.delete(&self.path).await?;
        Ok(())
    }
}

// =============================================================================
// Exists
// =============================================================================

/// Arguments for the exists command.
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Logical path to check.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ExistsArgs {
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        let exists = adapter.has(&self.path).await?;

        if global.json {
            self.output
                .write_json(&json!({ "path": self.path, "exists": exists }))
                .await?;
        } else {
            self.output.write_str(&exists.to_string()).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Stat
// =============================================================================

/// Arguments for the stat command.
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Logical path to describe.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl StatArgs {
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        let mapping = adapter.get_metadata(&self.path).await?;

        if global.json {
            self.output.write_json(&mapping).await?;
        } else {
            let text = format!(
                "path: {}\nfid: {}\nsize: {}\ncontent_type: {}\ntimestamp: {}",
                mapping.path, mapping.fid, mapping.size, mapping.content_type, mapping.timestamp
            );
            self.output.write_str(&text).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Url
// =============================================================================

/// Arguments for the url command.
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Logical path to resolve.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl UrlArgs {
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        let url = adapter.get_url(&self.path).await?;

        if global.json {
            self.output
                .write_json(&json!({ "path": self.path, "url": url }))
                .await?;
        } else {
            self.output.write_str(&url).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Arguments for the audit command.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Logical path to check against the blob store.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl AuditArgs {
    pub async fn run<B: BlobClient>(
        self,
        adapter: &PathAdapter<B>,
        global: &GlobalArgs,
    ) -> Result<()> {
        let status = adapter.audit(&self.path).await?;

        if global.json {
            self.output.write_json(&status).await?;
        } else {
            let text = match &status {
                DriftStatus::Consistent { mapping } => format!("consistent {}", mapping.fid),
                DriftStatus::MissingBlob { mapping } => format!("missing-blob {}", mapping.fid),
                DriftStatus::Unmapped => "unmapped".to_string(),
            };
            self.output.write_str(&text).await?;
        }
        Ok(())
    }
}
