//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "accounts.toml",
    "./config/config.toml",
    "/etc/accounts/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file not found, searching standard paths");
        }

        if let Ok(path) = env::var("ACCOUNTS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `ACCOUNTS_*` overrides read through `lookup`.
///
/// Unparseable numeric or boolean values are ignored; an unknown storage
/// provider is an error.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("ACCOUNTS_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("ACCOUNTS_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("ACCOUNTS_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Storage
    if let Some(val) = lookup("ACCOUNTS_STORAGE_PROVIDER") {
        config.storage.provider = val.parse()?;
    }

    // MongoDB
    if let Some(val) = lookup("ACCOUNTS_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("ACCOUNTS_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Seed
    if let Some(enabled) = lookup("ACCOUNTS_SEED_ENABLED").and_then(|v| v.parse().ok()) {
        config.seed.enabled = enabled;
    }
    if let Some(val) = lookup("ACCOUNTS_SEED_ADMIN_LOGIN") {
        config.seed.admin_login = val;
    }
    if let Some(val) = lookup("ACCOUNTS_SEED_ADMIN_PASSWORD") {
        config.seed.admin_password = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageProvider;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("ACCOUNTS_HTTP_PORT", "9090"),
                ("ACCOUNTS_CORS_ORIGINS", "http://a.test, http://b.test"),
                ("ACCOUNTS_STORAGE_PROVIDER", "mongodb"),
                ("ACCOUNTS_MONGODB_DATABASE", "accounts_test"),
                ("ACCOUNTS_SEED_ENABLED", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(config.http.port, 9090);
        assert_eq!(config.http.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.storage.provider, StorageProvider::Mongodb);
        assert_eq!(config.mongodb.database, "accounts_test");
        assert!(!config.seed.enabled);
    }

    #[test]
    fn test_unparseable_port_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, lookup_from(&[("ACCOUNTS_HTTP_PORT", "eighty")])).unwrap();
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_unknown_provider_is_error() {
        let mut config = AppConfig::default();
        let result = apply_overrides(&mut config, lookup_from(&[("ACCOUNTS_STORAGE_PROVIDER", "redis")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_explicit_path_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.toml");
        std::fs::write(&path, "[seed]\nadmin_login = \"Root\"\n").unwrap();

        let config = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(config.seed.admin_login, "Root");
    }
}
