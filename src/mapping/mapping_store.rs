use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::key_value_db::KeyValueDbError;
use crate::blob_client::Fid;

/// Errors raised by mapping persistence.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The underlying key-value database failed.
    #[error(transparent)]
    Db(#[from] KeyValueDbError),

    /// A stored record could not be encoded or decoded.
    #[error("corrupt mapping for '{path}': {message}")]
    Encoding { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, MappingError>;

/// Persistent record binding a logical path to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Caller-supplied hierarchical path; matched by exact string equality.
    pub path: String,
    /// Blob identifier assigned by the store.
    pub fid: Fid,
    /// Content type derived from the path when the blob was written.
    pub content_type: String,
    /// Size in bytes as of the last successful write.
    pub size: u64,
    /// Unix timestamp (seconds) of the last successful write.
    pub timestamp: i64,
}

/// Passive key-value surface holding path mappings.
///
/// No enumeration is offered. Implementations used outside tests must
/// persist across process restarts.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Look up the mapping for `path`.
    async fn get(&self, path: &str) -> Result<Option<PathMapping>>;

    /// Insert or fully replace the mapping keyed by `mapping.path`.
    async fn store(&self, mapping: &PathMapping) -> Result<()>;

    /// Remove the mapping for `path`. Removing an absent path is not an error.
    async fn remove(&self, path: &str) -> Result<()>;
}
