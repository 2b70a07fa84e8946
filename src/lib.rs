//! blobpath - Path-addressed storage on top of a flat, fid-addressed blob store.

pub mod adapter;
pub mod app;
pub mod blob_client;
pub mod cli;
pub mod config;
pub mod mapping;

pub use adapter::{AdapterError, DriftStatus, PathAdapter, WriteResult};
pub use blob_client::{BlobClient, BlobError, Fid, HttpBlobClient, MemoryBlobClient};
pub use mapping::{DbMappingStore, MappingStore, PathMapping};
