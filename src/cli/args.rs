//! Command-line argument definitions and helpers.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::app::AppContext;
use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during argument processing.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// I/O error reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for argument operations.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Global arguments that apply to all commands.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to the main configuration file.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Path to the configuration overrides file.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Configuration overrides in the form name=value.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Format output as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalArgs {
    /// Convert to a ConfigSource for reading configuration.
    pub fn to_config_source(&self) -> ConfigSource {
        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides: self.config_overrides.clone(),
        }
    }

    /// Convert to an AppContext for creating an App.
    pub fn to_app_context(&self) -> AppContext {
        AppContext {
            config_source: self.to_config_source(),
        }
    }
}

/// Parse a config override from "name=value" format.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid config override '{}': expected name=value", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Input/Output Helpers
// =============================================================================

/// Helper for commands that read content from a file or stdin.
#[derive(Args, Debug, Default)]
pub struct InputSource {
    /// Read content from this file instead of stdin.
    #[arg(id = "input_file", short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,
}

impl InputSource {
    /// Read the full content, from `file` if set, otherwise from stdin.
    pub async fn read_bytes(&self) -> Result<Bytes> {
        match &self.file {
            Some(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            None => {
                let mut contents = Vec::new();
                tokio::io::stdin().read_to_end(&mut contents).await?;
                Ok(Bytes::from(contents))
            }
        }
    }
}

/// Helper for commands that write output to a file or stdout.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// Write output to this file instead of stdout.
    #[arg(id = "output_file", short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Write a string value to the output.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, value).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(value.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }

    /// Write a value as pretty-printed JSON.
    pub async fn write_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.write_str(&output).await
    }

    /// Write raw bytes to the output.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, data).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(data).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_override() {
        assert_eq!(
            parse_config_override("blobstore.master_url=http://m:9333").unwrap(),
            (
                "blobstore.master_url".to_string(),
                "http://m:9333".to_string()
            )
        );
        assert_eq!(
            parse_config_override("blobstore.collection=").unwrap(),
            ("blobstore.collection".to_string(), String::new())
        );
        assert!(parse_config_override("no-equals").is_err());
    }

    #[test]
    fn test_to_config_source() {
        let global = GlobalArgs {
            config_file: Some(PathBuf::from("/etc/blobpath.ini")),
            config_overrides: vec![("mapping.path".to_string(), "/m".to_string())],
            ..Default::default()
        };
        let source = global.to_config_source();
        assert_eq!(source.config_file, Some(PathBuf::from("/etc/blobpath.ini")));
        assert!(source.override_file.is_none());
        assert_eq!(source.overrides.len(), 1);
    }

    #[tokio::test]
    async fn test_input_and_output_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let input_path = dir.path().join("in.bin");
        let output_path = dir.path().join("out.bin");
        std::fs::write(&input_path, b"\x00\x01payload").unwrap();

        let input = InputSource {
            file: Some(input_path),
        };
        let data = input.read_bytes().await.unwrap();
        assert_eq!(&data[..], b"\x00\x01payload");

        let output = OutputSink {
            file: Some(output_path.clone()),
        };
        output.write_bytes(&data).await.unwrap();
        assert_eq!(std::fs::read(&output_path).unwrap(), b"\x00\x01payload");
    }
}
