//! Configuration helper for interpreting config values.

use std::time::Duration;

use super::Config;
use crate::blob_client::HttpBlobClientConfig;

/// Helper for interpreting configuration values.
///
/// Wraps a `Config` and converts its sections into the settings the
/// components are constructed from.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    config: Config,
}

impl ConfigHelper {
    /// Create a new ConfigHelper wrapping the given config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settings for the HTTP blob client.
    pub fn http_blob_client_config(&self) -> HttpBlobClientConfig {
        let blobstore = &self.config.blobstore;
        HttpBlobClientConfig {
            master_url: blobstore.master_url.clone(),
            replication: blobstore.replication.clone(),
            collection: blobstore.collection.clone(),
            timeout: Duration::from_secs(blobstore.timeout_secs),
        }
    }

    /// Base URL overriding volume public addresses, if configured.
    pub fn public_base_url(&self) -> Option<String> {
        self.config.blobstore.public_url.clone()
    }

    /// LMDB map size in bytes, saturated to the platform's `usize`.
    pub fn mapping_map_size(&self) -> usize {
        usize::try_from(self.config.mapping.map_size.0).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{BlobStoreConfig, ByteSize, MappingConfig};

    #[test]
    fn test_http_blob_client_config() {
        let helper = ConfigHelper::new(Config {
            blobstore: BlobStoreConfig {
                master_url: "http://master:9333".to_string(),
                public_url: Some("https://cdn.example.com".to_string()),
                timeout_secs: 5,
                replication: Some("001".to_string()),
                collection: None,
            },
            mapping: MappingConfig {
                path: PathBuf::from("/var/lib/blobpath"),
                map_size: ByteSize(64 * 1024 * 1024),
            },
        });

        let client = helper.http_blob_client_config();
        assert_eq!(client.master_url, "http://master:9333");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.replication.as_deref(), Some("001"));
        assert_eq!(
            helper.public_base_url().as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(helper.mapping_map_size(), 64 * 1024 * 1024);
    }
}
