//! Configuration management for billweb
//!
//! This module handles loading, validation, and management of
//! billweb configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_false")]
    pub cors_enable: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enable: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12480
}

fn default_false() -> bool {
    false
}

/// Storage backend enumeration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-process map, lost on exit
    Memory,
    /// Single-file SQLite database
    Sqlite,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Sqlite
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which key-value backend to open
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file path (sqlite backend only)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./ledger_data/ledger.db")
}

/// Search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hard cap on hits returned by a single search
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Page size used when the request gives none or an invalid one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Largest page size a request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_results() -> usize {
    1000
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::IoError)?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.max_results".to_string(),
                reason: "Maximum result count must be at least 1".to_string(),
            });
        }

        if self.search.default_page_size == 0
            || self.search.default_page_size > self.search.max_page_size
        {
            return Err(ConfigError::InvalidValue {
                field: "search.default_page_size".to_string(),
                reason: "Default page size must be between 1 and search.max_page_size".to_string(),
            });
        }

        if self.search.max_page_size > self.search.max_results {
            return Err(ConfigError::InvalidValue {
                field: "search.max_page_size".to_string(),
                reason: "Maximum page size must not exceed search.max_results".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Server listen address in `host:port` form
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 12480);
        assert_eq!(config.listen_addr(), "127.0.0.1:12480");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.search.max_results, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml("server:\n  port: 9000\nstorage:\n  backend: memory\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.search.default_page_size, 10);
    }

    #[test]
    fn test_generated_default_is_valid() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("server: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml));
    }

    #[test]
    fn test_validate_page_sizes() {
        let mut config = Config::default();
        config.search.default_page_size = 500;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "search.default_page_size"));

        let mut config = Config::default();
        config.search.max_page_size = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/billweb.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("badger".parse::<StorageBackend>().is_err());
    }
}
