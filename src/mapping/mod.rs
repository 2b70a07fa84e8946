//! Path-to-blob mapping persistence.
//!
//! ## Architecture
//!
//! 1. **KeyValueDb** - low-level byte key-value storage
//!    - [`LmdbKeyValueDb`] - LMDB-backed, persistent
//!    - [`MemoryKeyValueDb`] - in-memory, for tests
//!
//! 2. **MappingStore** - `get`/`store`/`remove` of [`PathMapping`] records by exact path
//!    - [`DbMappingStore`] - JSON records in any `KeyValueDb`

mod db_mapping_store;
mod key_value_db;
mod lmdb_key_value_db;
mod mapping_store;
mod memory_key_value_db;

pub use db_mapping_store::DbMappingStore;
pub use key_value_db::{KeyValueDb, KeyValueDbError, KeyValueDbWrites, WriteOp};
pub use lmdb_key_value_db::{DEFAULT_MAP_SIZE, LmdbKeyValueDb};
pub use mapping_store::{MappingError, MappingStore, PathMapping, Result};
pub use memory_key_value_db::MemoryKeyValueDb;
