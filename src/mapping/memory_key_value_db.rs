use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::key_value_db::{KeyValueDb, KeyValueDbWrites, Result, WriteOp};

/// An in-memory implementation of `KeyValueDb`, intended primarily for testing.
///
/// Contents are lost when the last handle is dropped.
#[derive(Default)]
pub struct MemoryKeyValueDb {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryKeyValueDb {
    /// Create a new empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the database holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueDb for MemoryKeyValueDb {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    async fn write(&self) -> Result<Box<dyn KeyValueDbWrites + Send>> {
        Ok(Box::new(MemoryWrites {
            entries: self.entries.clone(),
            pending: Vec::new(),
        }))
    }
}

struct MemoryWrites {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
    pending: Vec<WriteOp>,
}

#[async_trait]
impl KeyValueDbWrites for MemoryWrites {
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>) {
        self.pending.push(WriteOp::Set { key, value: val });
    }

    fn del(&mut self, key: Vec<u8>) {
        self.pending.push(WriteOp::Del { key });
    }

    async fn flush(self: Box<Self>) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        for op in self.pending {
            match op {
                WriteOp::Set { key, value } => {
                    entries.insert(key, value);
                }
                WriteOp::Del { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let db = MemoryKeyValueDb::new();

        let mut writes = db.write().await.unwrap();
        writes.set(b"a".to_vec(), b"1".to_vec());
        writes.set(b"a".to_vec(), b"2".to_vec());
        writes.set(b"b".to_vec(), b"3".to_vec());
        writes.del(b"b".to_vec());

        // Nothing visible until flush
        assert!(db.is_empty());

        writes.flush().await.unwrap();
        assert_eq!(db.get(b"a").await.unwrap(), Some(b"2".to_vec()));
        assert!(db.get(b"b").await.unwrap().is_none());
        assert_eq!(db.len(), 1);
    }
}
