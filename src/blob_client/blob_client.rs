use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Opaque blob identifier assigned by the blob store, e.g. `"3,01637037d6"`.
///
/// The part before the comma names the volume the blob was placed on.
pub type Fid = String;

/// Current physical placement of a blob.
///
/// Obtained by resolving a fid through [`BlobClient::lookup`]. Never persisted
/// or cached across calls, since the store may move volumes at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobLocation {
    /// The blob this location was resolved for.
    pub fid: Fid,
    /// Address of the volume server holding the blob (used for uploads, reads, deletes).
    pub url: String,
    /// Address under which the volume is reachable by external clients.
    pub public_url: String,
}

/// Descriptor returned by the store after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Final blob identifier. Equal to the targeted fid for in-place replacement.
    pub fid: Fid,
    /// Number of bytes stored.
    pub size: u64,
    /// Volume address the content was written to.
    pub url: String,
    /// Public volume address for building retrievable URLs.
    pub public_url: String,
}

/// Error type for blob store operations.
///
/// Every transport, protocol, or not-found condition surfaces as one of these.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The fid (or its volume) is unknown to the store.
    #[error("blob not found: {0}")]
    NotFound(Fid),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The store answered with a status the operation does not accept.
    #[error("unexpected status code {status} while {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The store answered but the payload could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The upload was accepted but no result descriptor came back.
    #[error("upload returned no result")]
    EmptyResponse,
}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        BlobError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlobError>;

/// Byte stream over a blob's content.
pub type ByteStream = Pin<Box<dyn futures::Stream<Item = Result<Bytes>> + Send>>;

/// Capability interface to a flat, fid-addressed blob store.
///
/// Implementations own fid assignment and volume placement; callers never
/// invent fids. All operations are asynchronous.
pub trait BlobClient: Send + Sync {
    /// Resolve the volume currently holding `fid`.
    ///
    /// Returns `BlobError::NotFound` if the identifier is unknown.
    fn lookup(&self, fid: &Fid) -> impl Future<Output = Result<BlobLocation>> + Send;

    /// Upload `contents` under `filename`.
    ///
    /// With `target` set, the bytes of `target.fid` are replaced in place on
    /// the target's volume and the same fid is returned. Without a target a
    /// fresh fid is assigned.
    fn upload(
        &self,
        contents: Bytes,
        filename: &str,
        target: Option<&BlobLocation>,
    ) -> impl Future<Output = Result<UploadResult>> + Send;

    /// Fetch a blob's full content.
    fn fetch(&self, fid: &Fid) -> impl Future<Output = Result<Bytes>> + Send;

    /// Open a stream over a blob's content.
    fn fetch_stream(&self, fid: &Fid) -> impl Future<Output = Result<ByteStream>> + Send;

    /// Check whether a blob exists.
    fn has(&self, fid: &Fid) -> impl Future<Output = Result<bool>> + Send;

    /// Delete a blob. Fails on any I/O or protocol error.
    fn delete(&self, fid: &Fid) -> impl Future<Output = Result<()>> + Send;

    /// Build the externally retrievable URL for `fid` served from `base_url`.
    fn public_url(&self, base_url: &str, fid: &Fid) -> String;
}

/// Extract the volume id from a fid (`"3,01637037d6"` -> `"3"`).
pub fn volume_id(fid: &str) -> Result<&str> {
    match fid.split_once(',') {
        Some((volume, key)) if !volume.is_empty() && !key.is_empty() => Ok(volume),
        _ => Err(BlobError::Protocol(format!("malformed fid '{}'", fid))),
    }
}

/// Join a volume address and a fid, adding `http://` when the address has no scheme.
pub fn volume_url(base_url: &str, fid: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/{}", base, fid)
    } else {
        format!("http://{}/{}", base, fid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_id() {
        assert_eq!(volume_id("3,01637037d6").unwrap(), "3");
        assert_eq!(volume_id("17,ab").unwrap(), "17");
        assert!(volume_id("01637037d6").is_err());
        assert!(volume_id(",01").is_err());
        assert!(volume_id("3,").is_err());
    }

    #[test]
    fn test_volume_url() {
        assert_eq!(volume_url("127.0.0.1:8080", "3,01"), "http://127.0.0.1:8080/3,01");
        assert_eq!(
            volume_url("https://cdn.example.com/", "3,01"),
            "https://cdn.example.com/3,01"
        );
    }
}
