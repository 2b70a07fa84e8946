//! LMDB-based key-value database implementation.
//!
//! Uses the heed crate to provide a persistent key-value store backed by LMDB.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use super::key_value_db::{KeyValueDb, KeyValueDbError, KeyValueDbWrites, Result, WriteOp};

/// Default maximum size of the memory map (1GB).
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

fn db_err(e: impl std::fmt::Display) -> KeyValueDbError {
    KeyValueDbError::Database(e.to_string())
}

// =============================================================================
// LmdbKeyValueDb
// =============================================================================

/// An LMDB-backed key-value database.
///
/// Every `write()` handle commits in its own write transaction on flush.
pub struct LmdbKeyValueDb {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
}

impl LmdbKeyValueDb {
    /// Open (or create) an LMDB database at the given path with the default map size.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(path: &Path) -> Result<Self> {
        Self::with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open (or create) an LMDB database with an explicit map size in bytes.
    pub fn with_map_size(path: &Path, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)
                .map_err(db_err)?
        };

        let mut wtxn = env.write_txn().map_err(db_err)?;
        let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, None).map_err(db_err)?;
        wtxn.commit().map_err(db_err)?;

        Ok(Self {
            env: Arc::new(env),
            db,
        })
    }

    async fn read_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let env = self.env.clone();
        let db = self.db;
        let key = key.to_vec();

        tokio::task::spawn_blocking(move || {
            let rtxn = env.read_txn().map_err(db_err)?;
            let value = db.get(&rtxn, &key).map_err(db_err)?.map(|v| v.to_vec());
            Ok(value)
        })
        .await
        .map_err(db_err)?
    }
}

#[async_trait]
impl KeyValueDb for LmdbKeyValueDb {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.read_value(key).await
    }

    async fn write(&self) -> Result<Box<dyn KeyValueDbWrites + Send>> {
        Ok(Box::new(LmdbWrites {
            env: self.env.clone(),
            db: self.db,
            pending: Vec::new(),
        }))
    }
}

// =============================================================================
// LmdbWrites
// =============================================================================

struct LmdbWrites {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
    pending: Vec<WriteOp>,
}

#[async_trait]
impl KeyValueDbWrites for LmdbWrites {
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>) {
        self.pending.push(WriteOp::Set { key, value: val });
    }

    fn del(&mut self, key: Vec<u8>) {
        self.pending.push(WriteOp::Del { key });
    }

    async fn flush(self: Box<Self>) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let env = self.env;
        let db = self.db;
        let pending = self.pending;

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn().map_err(db_err)?;

            for op in pending {
                match op {
                    WriteOp::Set { key, value } => {
                        db.put(&mut wtxn, &key, &value).map_err(db_err)?;
                    }
                    WriteOp::Del { key } => {
                        db.delete(&mut wtxn, &key).map_err(db_err)?;
                    }
                }
            }

            wtxn.commit().map_err(db_err)?;
            Ok(())
        })
        .await
        .map_err(db_err)?
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();

        assert!(db.get(b"key1").await.unwrap().is_none());

        let mut writes = db.write().await.unwrap();
        writes.set(b"key1".to_vec(), b"value1".to_vec());
        writes.flush().await.unwrap();

        assert_eq!(db.get(b"key1").await.unwrap(), Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();

        let mut writes = db.write().await.unwrap();
        writes.set(b"key1".to_vec(), b"value1".to_vec());
        writes.flush().await.unwrap();

        let mut writes = db.write().await.unwrap();
        writes.del(b"key1".to_vec());
        writes.flush().await.unwrap();

        assert!(db.get(b"key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();
            let mut writes = db.write().await.unwrap();
            writes.set(b"key1".to_vec(), b"value1".to_vec());
            writes.flush().await.unwrap();
        }

        let db = LmdbKeyValueDb::new(temp_dir.path()).unwrap();
        assert_eq!(db.get(b"key1").await.unwrap(), Some(b"value1".to_vec()));
    }
}
