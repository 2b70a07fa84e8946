//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

use super::{BlobStoreConfig, ByteSize, Config, MappingConfig};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_MASTER_URL: &str = "http://localhost:9333";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAPPING_PATH: &str = "/tmp/blobpath-mappings";
const DEFAULT_MAPPING_MAP_SIZE: u64 = 1024 * 1024 * 1024; // 1GB

const ENV_CONFIG_FILE: &str = "BLOBPATH_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".blobpath";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid byte size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to BLOBPATH_CONFIG_FILE env var, then ~/.blobpath.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "blobstore.master_url", "mapping.path"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// ByteSize Parsing
// =============================================================================

impl ByteSize {
    /// Parse a byte size from a string like "100MB", "1GB", "500KB", or plain "1024".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "empty string".to_string(),
            });
        }

        let num_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        if num_end == 0 {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "no numeric value".to_string(),
            });
        }

        let base: u64 = s[..num_end]
            .parse()
            .map_err(|e| ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: format!("invalid number: {}", e),
            })?;

        let suffix = s[num_end..].trim().to_uppercase();
        let multiplier: u64 = match suffix.as_str() {
            "" | "B" => 1,
            "K" | "KB" => 1024,
            "M" | "MB" => 1024 * 1024,
            "G" | "GB" => 1024 * 1024 * 1024,
            "T" | "TB" => 1024 * 1024 * 1024 * 1024,
            _ => {
                return Err(ConfigError::InvalidByteSize {
                    value: s.to_string(),
                    message: format!("unknown suffix '{}'", suffix),
                });
            }
        };

        Ok(ByteSize(base.saturating_mul(multiplier)))
    }
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    if let Some(ref path) = source.config_file {
        return if path.exists() {
            Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            })
        } else {
            Err(ConfigError::FileNotFound(path.clone()))
        };
    }

    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        }
        // Warn but continue with defaults
        return Ok(ResolvedConfigFile {
            path: None,
            warning: Some(format!(
                "config file specified by {} does not exist: {}",
                ENV_CONFIG_FILE, env_path
            )),
        });
    }

    if let Some(home) = env::var_os("HOME").map(PathBuf::from) {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        blobstore: BlobStoreConfig {
            master_url: DEFAULT_MASTER_URL.to_string(),
            public_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            replication: None,
            collection: None,
        },
        mapping: MappingConfig {
            path: PathBuf::from(DEFAULT_MAPPING_PATH),
            map_size: ByteSize(DEFAULT_MAPPING_MAP_SIZE),
        },
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

/// Apply an INI file's contents to a Config, layering on top of existing values.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    for section in ["blobstore", "mapping"] {
        let Some(entries) = ini.get_map_ref().get(section) else {
            continue;
        };
        for (key, value) in entries {
            if let Some(value) = value {
                apply_override(config, &format!("{}.{}", section, key), value)?;
            }
        }
    }
    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some(("blobstore", param)) => apply_blobstore_override(config, param, value),
        Some(("mapping", param)) => apply_mapping_override(config, param, value),
        _ => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_blobstore_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    let blobstore = &mut config.blobstore;
    match param {
        "master_url" => blobstore.master_url = value.to_string(),
        "public_url" => blobstore.public_url = non_empty(value),
        "timeout_secs" => {
            let secs: u64 = value.parse().map_err(|e| ConfigError::InvalidInteger {
                value: value.to_string(),
                source: e,
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "blobstore.timeout_secs".to_string(),
                    message: "must be at least 1 second".to_string(),
                });
            }
            blobstore.timeout_secs = secs;
        }
        "replication" => blobstore.replication = non_empty(value),
        "collection" => blobstore.collection = non_empty(value),
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key: format!("blobstore.{}", param),
                message: "unknown parameter".to_string(),
            });
        }
    }
    Ok(())
}

fn apply_mapping_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "path" => config.mapping.path = PathBuf::from(value),
        "map_size" => config.mapping.map_size = ByteSize::parse(value)?,
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key: format!("mapping.{}", param),
                message: "unknown parameter".to_string(),
            });
        }
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.blobpath)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();
    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytesize_parse() {
        assert_eq!(ByteSize::parse("100").unwrap().0, 100);
        assert_eq!(ByteSize::parse("100KB").unwrap().0, 100 * 1024);
        assert_eq!(ByteSize::parse("100M").unwrap().0, 100 * 1024 * 1024);
        assert_eq!(ByteSize::parse("1GB").unwrap().0, 1024 * 1024 * 1024);
        assert_eq!(ByteSize::parse("  50mb  ").unwrap().0, 50 * 1024 * 1024);
    }

    #[test]
    fn test_bytesize_parse_errors() {
        assert!(ByteSize::parse("").is_err());
        assert!(ByteSize::parse("MB").is_err());
        assert!(ByteSize::parse("100XB").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.blobstore.master_url, "http://localhost:9333");
        assert_eq!(config.blobstore.timeout_secs, 30);
        assert!(config.blobstore.public_url.is_none());
        assert_eq!(config.mapping.path, PathBuf::from("/tmp/blobpath-mappings"));
        assert_eq!(config.mapping.map_size, ByteSize(1024 * 1024 * 1024));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = default_config();
        apply_override(&mut config, "blobstore.master_url", "http://master:9333").unwrap();
        apply_override(&mut config, "blobstore.timeout_secs", "5").unwrap();
        apply_override(&mut config, "blobstore.collection", "avatars").unwrap();
        apply_override(&mut config, "mapping.path", "/data/mappings").unwrap();
        apply_override(&mut config, "mapping.map_size", "256MB").unwrap();

        assert_eq!(config.blobstore.master_url, "http://master:9333");
        assert_eq!(config.blobstore.timeout_secs, 5);
        assert_eq!(config.blobstore.collection.as_deref(), Some("avatars"));
        assert_eq!(config.mapping.path, PathBuf::from("/data/mappings"));
        assert_eq!(config.mapping.map_size, ByteSize(256 * 1024 * 1024));

        apply_override(&mut config, "blobstore.collection", "").unwrap();
        assert!(config.blobstore.collection.is_none());
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = default_config();
        assert!(matches!(
            apply_override(&mut config, "blobstore.bogus", "1"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "nosection", "1"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "blobstore.timeout_secs", "soon"),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = default_config();
        assert!(matches!(
            apply_override(&mut config, "blobstore.timeout_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config.blobstore.timeout_secs, 30);

        let mut ini = Ini::new();
        ini.read("[blobstore]\ntimeout_secs = 0\n".to_string()).unwrap();
        assert!(apply_ini_to_config(&mut config, &ini).is_err());
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let source = ConfigSource {
            config_file: Some(PathBuf::from("/nonexistent/blobpath.ini")),
            ..Default::default()
        };
        assert!(matches!(
            read_config(&source),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_parse_ini_config() {
        let mut ini = Ini::new();
        ini.read(
            r#"
[blobstore]
master_url = http://seaweed-master:9333
public_url = https://files.example.com
replication = 001

[mapping]
path = /var/lib/blobpath
map_size = 2GB
"#
            .to_string(),
        )
        .unwrap();

        let mut config = default_config();
        apply_ini_to_config(&mut config, &ini).unwrap();

        assert_eq!(config.blobstore.master_url, "http://seaweed-master:9333");
        assert_eq!(
            config.blobstore.public_url.as_deref(),
            Some("https://files.example.com")
        );
        assert_eq!(config.blobstore.replication.as_deref(), Some("001"));
        assert_eq!(config.blobstore.timeout_secs, 30);
        assert_eq!(config.mapping.path, PathBuf::from("/var/lib/blobpath"));
        assert_eq!(config.mapping.map_size, ByteSize(2 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_layered_override_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("base.ini");
        let layer = dir.path().join("layer.ini");
        std::fs::write(&base, "[blobstore]\nmaster_url = http://a:9333\ntimeout_secs = 10\n")
            .unwrap();
        std::fs::write(&layer, "[blobstore]\nmaster_url = http://b:9333\n").unwrap();

        let source = ConfigSource {
            config_file: Some(base),
            override_file: Some(layer),
            overrides: vec![("mapping.path".to_string(), "/m".to_string())],
        };
        let result = read_config(&source).unwrap();

        assert_eq!(result.config.blobstore.master_url, "http://b:9333");
        assert_eq!(result.config.blobstore.timeout_secs, 10);
        assert_eq!(result.config.mapping.path, PathBuf::from("/m"));
        assert!(result.warnings.is_empty());
    }
}
