//! Blob store client capability.
//!
//! A [`BlobClient`] addresses content by an opaque fid that the store assigns
//! and places on a volume. Two implementations are provided:
//!
//! - [`HttpBlobClient`] - talks to a master/volume blob store over HTTP
//! - [`MemoryBlobClient`] - in-process store, used by tests

mod blob_client;
mod http_blob_client;
mod memory_blob_client;

pub use blob_client::{
    BlobClient, BlobError, BlobLocation, ByteStream, Fid, Result, UploadResult, volume_id,
    volume_url,
};
pub use http_blob_client::{HttpBlobClient, HttpBlobClientConfig};
pub use memory_blob_client::MemoryBlobClient;
