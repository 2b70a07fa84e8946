//! Key-value database trait and types.
//!
//! This module defines the byte-oriented storage interface that path mappings
//! are persisted through.

use async_trait::async_trait;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during key-value database operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyValueDbError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error (e.g., from LMDB).
    #[error("database error: {0}")]
    Database(String),
}

/// Result type for key-value database operations.
pub type Result<T> = std::result::Result<T, KeyValueDbError>;

// =============================================================================
// KeyValueDb Trait
// =============================================================================

/// A key-value database interface.
#[async_trait]
pub trait KeyValueDb: Send + Sync {
    /// Get the value for a key, returning `None` if not found.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Get a write handle.
    ///
    /// Writes made through the handle are buffered and applied atomically
    /// by [`KeyValueDbWrites::flush`].
    async fn write(&self) -> Result<Box<dyn KeyValueDbWrites + Send>>;
}

// =============================================================================
// KeyValueDbWrites Trait
// =============================================================================

/// A write handle for buffered writes to a key-value database.
#[async_trait]
pub trait KeyValueDbWrites: Send {
    /// Set a key-value pair (buffered).
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>);

    /// Delete a key (buffered).
    fn del(&mut self, key: Vec<u8>);

    /// Apply all buffered writes to the database.
    async fn flush(self: Box<Self>) -> Result<()>;
}

// =============================================================================
// Write Operation Enum
// =============================================================================

/// A pending write operation.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Set a key to a value.
    Set { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Del { key: Vec<u8> },
}
