//! Application configuration.
//!
//! Defaults, optionally overlaid by a YAML file named in `BABY_GROWTH_CONFIG`,
//! then by individual `BABY_GROWTH_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "BABY_GROWTH_CONFIG";
pub const DATABASE_URL_ENV: &str = "BABY_GROWTH_DATABASE_URL";
pub const BIND_ADDRESS_ENV: &str = "BABY_GROWTH_BIND_ADDRESS";
pub const CORS_ORIGIN_ENV: &str = "BABY_GROWTH_CORS_ORIGIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Origin allowed by CORS, usually the frontend dev server
    pub cors_origin: String,
    /// Header carrying the authenticated email set by the fronting proxy
    pub identity_header: String,
    /// Create users on first sight instead of rejecting unknown emails
    pub auto_provision_users: bool,
    pub max_upload_bytes: usize,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:baby_growth.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            identity_header: "x-user-email".to_string(),
            auto_provision_users: false,
            max_upload_bytes: 10 * 1024 * 1024,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for environment variables
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(url) = lookup(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Some(address) = lookup(BIND_ADDRESS_ENV) {
            config.bind_address = address;
        }
        if let Some(origin) = lookup(CORS_ORIGIN_ENV) {
            config.cors_origin = origin;
        }

        Ok(config)
    }

    /// Read a YAML file; keys it omits keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::load_with(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_upload_bytes, 10_485_760);
        assert_eq!(config.identity_header, "x-user-email");
    }

    #[test]
    fn test_file_then_environment_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_url: \"sqlite:/tmp/from-file.db\"").unwrap();
        writeln!(file, "bind_address: \"0.0.0.0:8000\"").unwrap();
        writeln!(file, "auto_provision_users: true").unwrap();

        let mut vars = HashMap::new();
        vars.insert(CONFIG_PATH_ENV, file.path().display().to_string());
        vars.insert(BIND_ADDRESS_ENV, "127.0.0.1:9999".to_string());

        let config = AppConfig::load_with(lookup_from(vars)).unwrap();
        assert_eq!(config.database_url, "sqlite:/tmp/from-file.db");
        assert_eq!(config.bind_address, "127.0.0.1:9999");
        assert!(config.auto_provision_users);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_upload_bytes: [not, a, number]").unwrap();

        let mut vars = HashMap::new();
        vars.insert(CONFIG_PATH_ENV, file.path().display().to_string());
        assert!(AppConfig::load_with(lookup_from(vars)).is_err());

        let mut missing = HashMap::new();
        missing.insert(CONFIG_PATH_ENV, "/definitely/not/here.yaml".to_string());
        assert!(AppConfig::load_with(lookup_from(missing)).is_err());
    }
}
