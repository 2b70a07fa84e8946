use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use super::content_type;
use super::error::{AdapterError, Result};
use crate::blob_client::{BlobClient, BlobError, ByteStream, Fid};
use crate::mapping::{MappingStore, PathMapping};

/// Success payload of a write or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub path: String,
    pub fid: Fid,
    pub size: u64,
    pub content_type: String,
    pub timestamp: i64,
    /// Public URL of the stored blob.
    pub url: String,
}

/// Outcome of comparing a path's mapping with the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    /// The mapping exists and its blob is reachable.
    Consistent { mapping: PathMapping },
    /// The mapping exists but the store no longer has its blob.
    MissingBlob { mapping: PathMapping },
    /// No mapping exists for the path.
    Unmapped,
}

/// Exposes path-oriented file operations on top of a flat blob store.
///
/// Every mutating call follows lookup -> resolve -> upload/delete -> mapping
/// update, and the mapping is only touched after the blob store succeeded.
/// There is no locking across that sequence: concurrent writers to the same
/// path race and the last mapping upsert wins.
///
/// The mapping and the blob store can drift apart (a crash between a blob
/// operation and the mapping update, or blobs removed behind the adapter's
/// back). Drift is not repaired here; [`PathAdapter::audit`] reports it.
pub struct PathAdapter<B: BlobClient> {
    blobs: Arc<B>,
    mappings: Arc<dyn MappingStore>,
    public_base_url: Option<String>,
}

impl<B: BlobClient> PathAdapter<B> {
    /// Create an adapter over the given blob store and mapping store.
    pub fn new(blobs: Arc<B>, mappings: Arc<dyn MappingStore>) -> Self {
        Self {
            blobs,
            mappings,
            public_base_url: None,
        }
    }

    /// Serve URLs from `base_url` instead of each volume's public address.
    pub fn with_public_base_url(mut self, base_url: Option<String>) -> Self {
        self.public_base_url = base_url;
        self
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store `contents` at `path`.
    ///
    /// When `path` is already mapped the upload targets the existing fid so
    /// the store replaces that blob in place instead of leaking it.
    pub async fn write(&self, path: &str, contents: impl Into<Bytes>) -> Result<WriteResult> {
        let contents = contents.into();
        let existing = self.mappings.get(path).await?;

        let target = match &existing {
            Some(mapping) => {
                let location = self
                    .blobs
                    .lookup(&mapping.fid)
                    .await
                    .map_err(|e| store_failure(path, "locate", e))?;
                Some(location)
            }
            None => None,
        };

        debug!(
            path,
            size = contents.len(),
            replacing = target.as_ref().map(|t| t.fid.as_str()),
            "uploading"
        );
        let uploaded = self
            .blobs
            .upload(contents, file_name(path), target.as_ref())
            .await
            .map_err(|e| store_failure(path, "upload", e))?;

        let mapping = PathMapping {
            path: path.to_string(),
            fid: uploaded.fid.clone(),
            content_type: content_type::from_path(path).to_string(),
            size: uploaded.size,
            timestamp: Utc::now().timestamp(),
        };
        self.mappings.store(&mapping).await?;

        if let Some(previous) = existing.filter(|m| m.fid != uploaded.fid) {
            self.release_replaced(path, &previous.fid).await;
        }

        Ok(WriteResult {
            url: self.url_for(&uploaded.public_url, &mapping.fid),
            path: mapping.path,
            fid: mapping.fid,
            size: mapping.size,
            content_type: mapping.content_type,
            timestamp: mapping.timestamp,
        })
    }

    /// Same protocol as [`write`](Self::write).
    pub async fn update(&self, path: &str, contents: impl Into<Bytes>) -> Result<WriteResult> {
        self.write(path, contents).await
    }

    /// Read `reader` to the end and store it at `path` like [`write`](Self::write).
    pub async fn write_stream<R>(&self, path: &str, mut reader: R) -> Result<WriteResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| AdapterError::Input {
                path: path.to_string(),
                source: e,
            })?;
        self.write(path, buffer).await
    }

    /// Same protocol as [`write_stream`](Self::write_stream).
    pub async fn update_stream<R>(&self, path: &str, reader: R) -> Result<WriteResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.write_stream(path, reader).await
    }

    /// The store handed out a new fid despite the targeted upload; drop the old blob.
    async fn release_replaced(&self, path: &str, fid: &Fid) {
        match self.blobs.delete(fid).await {
            Ok(()) => debug!(path, fid = %fid, "released replaced blob"),
            Err(e) => warn!(path, fid = %fid, error = %e, "failed to release replaced blob"),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Return the content last written to `path`.
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let mapping = self.require(path).await?;
        self.blobs
            .fetch(&mapping.fid)
            .await
            .map_err(|e| store_failure(path, "fetch", e))
    }

    /// Open a stream over the content last written to `path`.
    pub async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let mapping = self.require(path).await?;
        self.blobs
            .fetch_stream(&mapping.fid)
            .await
            .map_err(|e| store_failure(path, "fetch", e))
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete the blob behind `path`, then its mapping.
    ///
    /// If the blob store fails the mapping is kept so the delete can be retried.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let mapping = self.require(path).await?;
        self.blobs
            .delete(&mapping.fid)
            .await
            .map_err(|e| store_failure(path, "delete", e))?;
        self.mappings.remove(path).await?;
        debug!(path, fid = %mapping.fid, "deleted");
        Ok(())
    }

    // =========================================================================
    // Existence and metadata
    // =========================================================================

    /// Whether `path` is mapped and its blob is reachable.
    pub async fn has(&self, path: &str) -> Result<bool> {
        match self.mappings.get(path).await? {
            Some(mapping) => self
                .blobs
                .has(&mapping.fid)
                .await
                .map_err(|e| store_failure(path, "check", e)),
            None => Ok(false),
        }
    }

    /// Cached metadata for `path`. Never contacts the blob store.
    pub async fn get_metadata(&self, path: &str) -> Result<PathMapping> {
        self.require(path).await
    }

    pub async fn get_size(&self, path: &str) -> Result<u64> {
        Ok(self.require(path).await?.size)
    }

    pub async fn get_mimetype(&self, path: &str) -> Result<String> {
        Ok(self.require(path).await?.content_type)
    }

    pub async fn get_timestamp(&self, path: &str) -> Result<i64> {
        Ok(self.require(path).await?.timestamp)
    }

    /// Retrievable URL for `path`, resolved against the blob's current volume.
    pub async fn get_url(&self, path: &str) -> Result<String> {
        let mapping = self.require(path).await?;
        let location = self
            .blobs
            .lookup(&mapping.fid)
            .await
            .map_err(|e| store_failure(path, "locate", e))?;
        Ok(self.url_for(&location.public_url, &mapping.fid))
    }

    /// Compare the mapping for `path` with the blob store. Read-only.
    pub async fn audit(&self, path: &str) -> Result<DriftStatus> {
        let Some(mapping) = self.mappings.get(path).await? else {
            return Ok(DriftStatus::Unmapped);
        };
        let present = self
            .blobs
            .has(&mapping.fid)
            .await
            .map_err(|e| store_failure(path, "check", e))?;

        if present {
            Ok(DriftStatus::Consistent { mapping })
        } else {
            warn!(path, fid = %mapping.fid, "mapping points at a missing blob");
            Ok(DriftStatus::MissingBlob { mapping })
        }
    }

    // =========================================================================
    // Unsupported
    // =========================================================================

    pub fn rename(&self, from: &str, _to: &str) -> Result<()> {
        Err(unsupported("rename", from))
    }

    pub fn copy(&self, from: &str, _to: &str) -> Result<()> {
        Err(unsupported("copy", from))
    }

    pub fn delete_dir(&self, path: &str) -> Result<()> {
        Err(unsupported("delete_dir", path))
    }

    pub fn create_dir(&self, path: &str) -> Result<()> {
        Err(unsupported("create_dir", path))
    }

    pub fn list_contents(&self, path: &str, _recursive: bool) -> Result<Vec<PathMapping>> {
        Err(unsupported("list_contents", path))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require(&self, path: &str) -> Result<PathMapping> {
        self.mappings
            .get(path)
            .await?
            .ok_or_else(|| AdapterError::NotFound {
                path: path.to_string(),
            })
    }

    fn url_for(&self, volume_public_url: &str, fid: &Fid) -> String {
        let base = self.public_base_url.as_deref().unwrap_or(volume_public_url);
        self.blobs.public_url(base, fid)
    }
}

fn store_failure(path: &str, operation: &'static str, source: BlobError) -> AdapterError {
    warn!(path, operation, error = %source, "blob store operation failed");
    AdapterError::StoreFailure {
        path: path.to_string(),
        operation,
        source,
    }
}

fn unsupported(operation: &'static str, path: &str) -> AdapterError {
    AdapterError::Unsupported {
        operation,
        path: path.to_string(),
    }
}

/// Last segment of `path`, used as the upload's file name.
fn file_name(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

// =============================================================================
// Tests
// =============================================================================
