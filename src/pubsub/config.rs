//! TOML configuration for brokers
//!
//! ```toml
//! [broker]
//! namespace = "shop"
//! address = "redis.internal:6379"
//! default_ttl_secs = 600
//! key_schema_version = 1
//! ```
//!
//! Every key is optional. An explicitly named file must exist; when no file is
//! named the default location is tried and silently skipped if absent.
//!
//! `key_schema_version` pins the store key layout a deployment expects. A build
//! writing a different layout refuses the file.

use crate::core::validation::{validate_namespace, validate_ttl_secs};
use crate::core::version;
use crate::pubsub::broker::DEFAULT_TTL_SECS;
use crate::store::StoreAddress;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "pubsub";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Error parsing configuration {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Connection and publishing settings for one [`crate::pubsub::Broker`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub namespace: String,
    /// `host`, `host:port` or a `redis://` URL
    pub address: String,
    pub default_ttl_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_schema_version: Option<u32>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            address: StoreAddress::default().to_string(),
            default_ttl_secs: DEFAULT_TTL_SECS,
            key_schema_version: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    broker: BrokerConfig,
}

impl BrokerConfig {
    /// `<config dir>/ReliablePubSub/pubsub.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ReliablePubSub").join("pubsub.toml"))
    }

    /// Load from `config_file`, or from the default location when `None`
    pub fn load(config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::default_path().filter(|path| path.exists()),
        };

        match config_path {
            Some(path) => Self::load_file(&path),
            None => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::parse(&contents, &path.display().to_string())?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text holding a `[broker]` table
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, "string")
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        file.broker.validate()?;
        Ok(file.broker)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_namespace(&self.namespace).map_err(|message| ConfigError::Invalid {
            field: "namespace".to_string(),
            message,
        })?;
        validate_ttl_secs(self.default_ttl_secs).map_err(|message| ConfigError::Invalid {
            field: "default_ttl_secs".to_string(),
            message,
        })?;
        if let Some(expected) = self.key_schema_version {
            version::check_key_schema_version(expected).map_err(|message| {
                ConfigError::Invalid {
                    field: "key_schema_version".to_string(),
                    message,
                }
            })?;
        }
        self.store_address()?;
        Ok(())
    }

    pub fn store_address(&self) -> Result<StoreAddress, ConfigError> {
        self.address
            .parse()
            .map_err(|e: crate::store::StoreError| ConfigError::Invalid {
                field: "address".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.namespace, "pubsub");
        assert_eq!(config.address, "localhost:6379");
        assert_eq!(config.default_ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_table() {
        let config = BrokerConfig::from_toml_str(
            r#"
            [broker]
            namespace = "shop"
            address = "redis://cache:6380/1"
            default_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.namespace, "shop");
        assert_eq!(
            config.store_address().unwrap(),
            StoreAddress::Url("redis://cache:6380/1".to_string())
        );
        assert_eq!(config.default_ttl_secs, 60);
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config = BrokerConfig::from_toml_str("[broker]\nnamespace = \"billing\"\n").unwrap();
        assert_eq!(config.namespace, "billing");
        assert_eq!(config.address, "localhost:6379");
        assert_eq!(config.default_ttl_secs, DEFAULT_TTL_SECS);

        let empty = BrokerConfig::from_toml_str("").unwrap();
        assert_eq!(empty, BrokerConfig::default());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let result = BrokerConfig::from_toml_str("[broker]\nnamespcae = \"typo\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_rejects_invalid_values() {
        match BrokerConfig::from_toml_str("[broker]\nnamespace = \"a.b\"\n") {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "namespace"),
            other => panic!("Expected Invalid namespace, got {:?}", other),
        }
        match BrokerConfig::from_toml_str("[broker]\ndefault_ttl_secs = 0\n") {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "default_ttl_secs"),
            other => panic!("Expected Invalid TTL, got {:?}", other),
        }
        match BrokerConfig::from_toml_str("[broker]\naddress = \"http://nope\"\n") {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "address"),
            other => panic!("Expected Invalid address, got {:?}", other),
        }
    }

    #[test]
    fn test_key_schema_version_must_match_build() {
        let current = version::key_schema_version();
        let config =
            BrokerConfig::from_toml_str(&format!("[broker]\nkey_schema_version = {}\n", current))
                .unwrap();
        assert_eq!(config.key_schema_version, Some(current));

        match BrokerConfig::from_toml_str(&format!(
            "[broker]\nkey_schema_version = {}\n",
            current + 1
        )) {
            Err(ConfigError::Invalid { field, message }) => {
                assert_eq!(field, "key_schema_version");
                assert!(message.contains(&format!("writes v{}", current)));
            }
            other => panic!("Expected Invalid key_schema_version, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_pattern_characters_in_namespace() {
        match BrokerConfig::from_toml_str("[broker]\nnamespace = \"ns[\"\n") {
            Err(ConfigError::Invalid { field, message }) => {
                assert_eq!(field, "namespace");
                assert!(message.contains("pattern character '['"));
            }
            other => panic!("Expected Invalid namespace, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[broker]\nnamespace = \"fromfile\"\ndefault_ttl_secs = 5").unwrap();

        let config = BrokerConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.namespace, "fromfile");
        assert_eq!(config.default_ttl_secs, 5);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        match BrokerConfig::load(Some(missing.clone())) {
            Err(ConfigError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[broker\nnamespace = ").unwrap();

        let err = BrokerConfig::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err
            .to_string()
            .contains(&file.path().display().to_string()));
    }
}
