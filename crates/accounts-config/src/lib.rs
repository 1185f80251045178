//! Accounts Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub mongodb: MongoConfig,
    pub seed: SeedConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Which storage backend holds user records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Process-local store; contents are lost on restart
    #[default]
    Memory,
    /// MongoDB collection (replica set required for transactions)
    Mongodb,
}

impl std::str::FromStr for StorageProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageProvider::Memory),
            "mongodb" | "mongo" => Ok(StorageProvider::Mongodb),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown storage provider '{}', expected 'memory' or 'mongodb'",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub provider: StorageProvider,
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true".to_string(),
            database: "accounts".to_string(),
        }
    }
}

/// Startup seeding of the well-known administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_login: String,
    pub admin_password: String,
    pub admin_name: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_login: "Admin".to_string(),
            admin_password: "Admin123".to_string(),
            admin_name: "Administrator".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::ValidationError("http.port must not be 0".to_string()));
        }
        if self.seed.enabled && self.seed.admin_login.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "seed.admin_login must not be empty when seeding is enabled".to_string(),
            ));
        }
        if self.storage.provider == StorageProvider::Mongodb {
            if self.mongodb.uri.trim().is_empty() {
                return Err(ConfigError::ValidationError("mongodb.uri is required".to_string()));
            }
            if self.mongodb.database.trim().is_empty() {
                return Err(ConfigError::ValidationError("mongodb.database is required".to_string()));
            }
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Accounts Configuration
# Environment variables (ACCOUNTS_*) override these settings

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["*"]

[storage]
provider = "memory"  # memory or mongodb

[mongodb]
uri = "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true"
database = "accounts"

[seed]
enabled = true
admin_login = "Admin"
admin_password = "Admin123"
admin_name = "Administrator"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.storage.provider, StorageProvider::Memory);
        assert!(config.seed.enabled);
        assert_eq!(config.seed.admin_login, "Admin");
        assert_eq!(config.seed.admin_password, "Admin123");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.mongodb.database, "accounts");
        assert_eq!(config.seed.admin_name, "Administrator");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nprovider = \"mongodb\"\n\n[http]\nport = 9000").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.storage.provider, StorageProvider::Mongodb);
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, "0.0.0.0");
        assert!(config.seed.enabled);
    }

    #[test]
    fn test_invalid_provider_rejected_by_parser() {
        let result: Result<AppConfig, _> = toml::from_str("[storage]\nprovider = \"redis\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_provider_from_str() {
        assert_eq!("memory".parse::<StorageProvider>().unwrap(), StorageProvider::Memory);
        assert_eq!("MongoDB".parse::<StorageProvider>().unwrap(), StorageProvider::Mongodb);
        assert!("sqlite".parse::<StorageProvider>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::default();
        config.http.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_rejects_blank_seed_login() {
        let mut config = AppConfig::default();
        config.seed.admin_login = "  ".to_string();
        assert!(config.validate().is_err());

        config.seed.enabled = false;
        assert!(config.validate().is_ok());
    }
}
