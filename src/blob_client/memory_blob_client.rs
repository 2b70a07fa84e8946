use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;

use super::blob_client::{
    BlobClient, BlobError, BlobLocation, ByteStream, Fid, Result, UploadResult, volume_url,
};

const MEMORY_VOLUME_ID: &str = "1";
const MEMORY_VOLUME_URL: &str = "127.0.0.1:8080";
const MEMORY_PUBLIC_URL: &str = "localhost:8080";

struct MemoryState {
    blobs: HashMap<Fid, Bytes>,
    next_key: u64,
}

/// An in-memory implementation of `BlobClient`, intended primarily for testing.
///
/// All blobs live on a single volume. Fids are assigned sequentially.
pub struct MemoryBlobClient {
    state: RwLock<MemoryState>,
}

impl MemoryBlobClient {
    /// Create a new empty in-memory blob store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                blobs: HashMap::new(),
                next_key: 1,
            }),
        }
    }

    /// Number of blobs currently stored.
    pub fn blob_count(&self) -> usize {
        self.state.read().unwrap().blobs.len()
    }

    fn location(fid: &Fid) -> BlobLocation {
        BlobLocation {
            fid: fid.clone(),
            url: MEMORY_VOLUME_URL.to_string(),
            public_url: MEMORY_PUBLIC_URL.to_string(),
        }
    }
}

impl Default for MemoryBlobClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobClient for MemoryBlobClient {
    async fn lookup(&self, fid: &Fid) -> Result<BlobLocation> {
        let state = self.state.read().unwrap();
        if state.blobs.contains_key(fid) {
            Ok(Self::location(fid))
        } else {
            Err(BlobError::NotFound(fid.clone()))
        }
    }

    async fn upload(
        &self,
        contents: Bytes,
        _filename: &str,
        target: Option<&BlobLocation>,
    ) -> Result<UploadResult> {
        let mut state = self.state.write().unwrap();
        let fid = match target {
            Some(location) => location.fid.clone(),
            None => {
                let fid = format!("{},{:08x}", MEMORY_VOLUME_ID, state.next_key);
                state.next_key += 1;
                fid
            }
        };
        let size = contents.len() as u64;
        state.blobs.insert(fid.clone(), contents);

        Ok(UploadResult {
            fid,
            size,
            url: MEMORY_VOLUME_URL.to_string(),
            public_url: MEMORY_PUBLIC_URL.to_string(),
        })
    }

    async fn fetch(&self, fid: &Fid) -> Result<Bytes> {
        let state = self.state.read().unwrap();
        state
            .blobs
            .get(fid)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(fid.clone()))
    }

    async fn fetch_stream(&self, fid: &Fid) -> Result<ByteStream> {
        let bytes = self.fetch(fid).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(bytes) })))
    }

    async fn has(&self, fid: &Fid) -> Result<bool> {
        let state = self.state.read().unwrap();
        Ok(state.blobs.contains_key(fid))
    }

    async fn delete(&self, fid: &Fid) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state
            .blobs
            .remove(fid)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(fid.clone()))
    }

    fn public_url(&self, base_url: &str, fid: &Fid) -> String {
        volume_url(base_url, fid)
    }
}
