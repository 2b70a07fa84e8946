//! Configuration types for blobpath.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::path::PathBuf;

/// A byte size that can be parsed from strings like "100MB", "1GB", etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

/// [blobstore] section - the blob store the adapter writes to.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// Master server base URL.
    pub master_url: String,
    /// Base URL that replaces the volume's public address in generated URLs.
    pub public_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Replication placement for fresh uploads.
    pub replication: Option<String>,
    /// Collection for fresh uploads.
    pub collection: Option<String>,
}

/// [mapping] section - where path mappings are persisted.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// LMDB environment directory.
    pub path: PathBuf,
    /// Maximum size of the LMDB memory map.
    pub map_size: ByteSize,
}

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub blobstore: BlobStoreConfig,
    pub mapping: MappingConfig,
}
