use std::sync::Arc;

use async_trait::async_trait;

use super::key_value_db::KeyValueDb;
use super::mapping_store::{MappingError, MappingStore, PathMapping, Result};

const KEY_PATH_PREFIX: &[u8] = b"path/";

fn path_key(path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(KEY_PATH_PREFIX.len() + path.len());
    key.extend_from_slice(KEY_PATH_PREFIX);
    key.extend_from_slice(path.as_bytes());
    key
}

/// A `MappingStore` persisting each mapping as a JSON value in a `KeyValueDb`.
///
/// Keys are `path/{path}`.
pub struct DbMappingStore {
    db: Arc<dyn KeyValueDb>,
}

impl DbMappingStore {
    pub fn new(db: Arc<dyn KeyValueDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MappingStore for DbMappingStore {
    async fn get(&self, path: &str) -> Result<Option<PathMapping>> {
        match self.db.get(&path_key(path)).await? {
            Some(bytes) => {
                let mapping =
                    serde_json::from_slice(&bytes).map_err(|e| MappingError::Encoding {
                        path: path.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, mapping: &PathMapping) -> Result<()> {
        let value = serde_json::to_vec(mapping).map_err(|e| MappingError::Encoding {
            path: mapping.path.clone(),
            message: e.to_string(),
        })?;

        let mut writes = self.db.write().await?;
        writes.set(path_key(&mapping.path), value);
        writes.flush().await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let mut writes = self.db.write().await?;
        writes.del(path_key(path));
        writes.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::mapping::{LmdbKeyValueDb, MemoryKeyValueDb};

    fn mapping(path: &str, fid: &str, size: u64) -> PathMapping {
        PathMapping {
            path: path.to_string(),
            fid: fid.to_string(),
            content_type: "image/png".to_string(),
            size,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_store_is_upsert() {
        let store = DbMappingStore::new(Arc::new(MemoryKeyValueDb::new()));

        assert!(store.get("a/b.png").await.unwrap().is_none());

        store.store(&mapping("a/b.png", "3,01", 10)).await.unwrap();
        store.store(&mapping("a/b.png", "3,01", 25)).await.unwrap();

        let stored = store.get("a/b.png").await.unwrap().unwrap();
        assert_eq!(stored.size, 25);
        assert_eq!(stored.fid, "3,01");
    }

    #[tokio::test]
    async fn test_exact_path_match() {
        let store = DbMappingStore::new(Arc::new(MemoryKeyValueDb::new()));
        store.store(&mapping("a/b.png", "3,01", 10)).await.unwrap();

        assert!(store.get("/a/b.png").await.unwrap().is_none());
        assert!(store.get("a/b.png/").await.unwrap().is_none());
        assert!(store.get("A/B.PNG").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = DbMappingStore::new(Arc::new(MemoryKeyValueDb::new()));
        store.store(&mapping("x", "3,01", 1)).await.unwrap();

        store.remove("x").await.unwrap();
        assert!(store.get("x").await.unwrap().is_none());

        // Removing again is fine
        store.remove("x").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let db = Arc::new(MemoryKeyValueDb::new());
        let mut writes = db.write().await.unwrap();
        writes.set(path_key("bad"), b"not json".to_vec());
        writes.flush().await.unwrap();

        let store = DbMappingStore::new(db);
        let result = store.get("bad").await;
        assert!(matches!(result, Err(MappingError::Encoding { .. })));
    }

    #[tokio::test]
    async fn test_mappings_persist_across_restart() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();
            let store = DbMappingStore::new(Arc::new(db));
            store.store(&mapping("docs/report.pdf", "7,2a", 4096)).await.unwrap();
        }

        let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();
        let store = DbMappingStore::new(Arc::new(db));
        let stored = store.get("docs/report.pdf").await.unwrap().unwrap();
        assert_eq!(stored, mapping("docs/report.pdf", "7,2a", 4096));
    }
}
