//! Top-level application component.
//!
//! The [`App`] owns the loaded configuration and wires the blob client and
//! mapping store together into a [`PathAdapter`].

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::adapter::PathAdapter;
use crate::blob_client::{BlobError, HttpBlobClient};
use crate::config::{ConfigHelper, ConfigSource, read_config};
use crate::mapping::{DbMappingStore, KeyValueDbError, LmdbKeyValueDb};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during App operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The mapping database could not be opened.
    #[error("failed to open mapping database: {0}")]
    MappingDb(#[from] KeyValueDbError),

    /// The blob client could not be constructed.
    #[error("failed to create blob client: {0}")]
    BlobClient(#[from] BlobError),
}

/// Result type for App operations.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Context Types
// =============================================================================

/// Context for creating an App.
#[derive(Default)]
pub struct AppContext {
    /// Source for configuration files.
    pub config_source: ConfigSource,
}

// =============================================================================
// App
// =============================================================================

/// The top-level application component.
pub struct App {
    config: ConfigHelper,
    warnings: Vec<String>,
}

impl App {
    /// Create a new App with the given context.
    pub fn new(ctx: AppContext) -> Result<Self> {
        let config_result =
            read_config(&ctx.config_source).map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            config: ConfigHelper::new(config_result.config),
            warnings: config_result.warnings,
        })
    }

    /// Get the configuration helper.
    pub fn config(&self) -> &ConfigHelper {
        &self.config
    }

    /// Warnings produced while loading configuration.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Open the mapping database and connect a path adapter to the configured blob store.
    pub fn create_adapter(&self) -> Result<PathAdapter<HttpBlobClient>> {
        let mapping = &self.config.config().mapping;
        debug!(path = %mapping.path.display(), "opening mapping database");
        let db = LmdbKeyValueDb::with_map_size(&mapping.path, self.config.mapping_map_size())?;
        let mappings = Arc::new(DbMappingStore::new(Arc::new(db)));

        let blobs = Arc::new(HttpBlobClient::new(self.config.http_blob_client_config())?);

        Ok(PathAdapter::new(blobs, mappings).with_public_base_url(self.config.public_base_url()))
    }
}
