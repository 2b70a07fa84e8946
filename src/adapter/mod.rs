//! Path-oriented file operations over a flat blob store.
//!
//! [`PathAdapter`] combines a [`MappingStore`](crate::mapping::MappingStore)
//! with a [`BlobClient`](crate::blob_client::BlobClient) and decides on each
//! mutating call whether to create a blob, replace one in place, or fail.

pub mod content_type;
mod error;
mod path_adapter;

pub use error::{AdapterError, Result};
pub use path_adapter::{DriftStatus, PathAdapter, WriteResult};
