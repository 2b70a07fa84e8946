use thiserror::Error;

use crate::blob_client::BlobError;
use crate::mapping::MappingError;

/// Errors returned by [`PathAdapter`](super::PathAdapter) operations.
///
/// A failed operation never carries a partial result.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No mapping exists for the path.
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// The blob store rejected or could not complete the request.
    #[error("blob store failed to {operation} '{path}': {source}")]
    StoreFailure {
        path: String,
        operation: &'static str,
        #[source]
        source: BlobError,
    },

    /// The operation has no counterpart in a flat blob store.
    #[error("{operation} is not supported (path '{path}')")]
    Unsupported {
        operation: &'static str,
        path: String,
    },

    /// The caller-supplied content stream could not be read.
    #[error("failed to read contents for '{path}': {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Mapping persistence failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl AdapterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound { .. })
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, AdapterError::StoreFailure { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, AdapterError::Unsupported { .. })
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
