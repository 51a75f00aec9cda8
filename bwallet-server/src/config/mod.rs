//! Configuration module for bwallet-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{RailsConfig, ServerConfig, SharedConfig};
use bwallet_core::rails::wire::WireAccount;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub rails: RailsConfig,
    pub return_url: Url,
    pub wire: WireAccount,
    pub operator_user_id: Uuid,
}

impl LoadedConfig {
    /// Wrap the reloadable sections in locks.
    pub fn shared(&self) -> SharedConfig {
        SharedConfig {
            return_url: Arc::new(RwLock::new(self.return_url.clone())),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides, validate, and build the
    /// runtime configuration.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let rails = &config.rails;
    if !is_http(&rails.base_url) {
        return Err(ConfigError::ValidationError(format!(
            "rails.base_url must be an http(s) URL, got {}",
            rails.base_url
        )));
    }
    // Url::join replaces the last segment unless the path ends with '/'.
    if !rails.base_url.path().ends_with('/') {
        return Err(ConfigError::ValidationError(
            "rails.base_url must end with '/'".to_string(),
        ));
    }
    if rails.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "rails.api_key is empty".to_string(),
        ));
    }
    if rails.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "rails.timeout_secs must be positive".to_string(),
        ));
    }

    if !is_http(&config.checkout.return_url) {
        return Err(ConfigError::ValidationError(format!(
            "checkout.return_url must be an http(s) URL, got {}",
            config.checkout.return_url
        )));
    }

    let wire = &config.wire;
    for (field, value) in [
        ("account_name", &wire.account_name),
        ("account_number", &wire.account_number),
        ("routing_number", &wire.routing_number),
        ("bank_name", &wire.bank_name),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "wire.{field} is empty"
            )));
        }
    }
    Ok(())
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        rails: RailsConfig {
            base_url: file_config.rails.base_url,
            api_key: file_config.rails.api_key,
            timeout: Duration::from_secs(file_config.rails.timeout_secs),
        },
        return_url: file_config.checkout.return_url,
        wire: WireAccount {
            account_name: file_config.wire.account_name,
            account_number: file_config.wire.account_number,
            routing_number: file_config.wire.routing_number,
            bank_name: file_config.wire.bank_name,
        },
        operator_user_id: file_config.operator.user_id,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileConfig {
        toml::from_str(
            r#"
[rails]
base_url = "https://rails.example.com/"
api_key = "test-key"
timeout_secs = 10

[checkout]
return_url = "https://app.example.com/wallet"

[wire]
account_name = "Brand Wallet Inc."
account_number = "000123456789"
routing_number = "021000021"
bank_name = "Example Bank"

[operator]
user_id = "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c01"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_builds() {
        let config = sample();
        validate(&config).unwrap();
        let loaded = build_loaded_config(config);
        assert_eq!(loaded.rails.timeout, Duration::from_secs(10));
        assert_eq!(loaded.wire.routing_number, "021000021");
        assert_eq!(loaded.server.listen.port(), 8080);
    }

    #[test]
    fn test_rejects_blank_wire_field() {
        let mut config = sample();
        config.wire.bank_name = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("wire.bank_name"));
    }

    #[test]
    fn test_rejects_base_url_without_trailing_slash() {
        let mut config = sample();
        config.rails.base_url = Url::parse("https://rails.example.com/v2").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_non_http_return_url() {
        let mut config = sample();
        config.checkout.return_url = Url::parse("mailto:ops@example.com").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_load_applies_listen_override() {
        let path = std::env::temp_dir().join(format!("bwallet-config-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, toml::to_string(&sample()).unwrap()).unwrap();

        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(listen)).load().unwrap();
        assert_eq!(loaded.server.listen, listen);

        std::fs::remove_file(&path).unwrap();
    }
}
