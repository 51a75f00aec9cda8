//! TOML file configuration structures.
//!
//! These structs directly map to the `bwallet-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;
use uuid::Uuid;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub rails: RailsConfig,
    pub checkout: CheckoutConfig,
    pub wire: WireConfig,
    pub operator: OperatorConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Payment rail endpoints (address issuance and card checkout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailsConfig {
    /// Base URL the rail function paths are joined onto.
    pub base_url: Url,
    /// Bearer token sent with every rail request.
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Where the card processor sends the user after checkout.
    pub return_url: Url,
}

/// Receiving bank account shown for wire deposits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireConfig {
    pub account_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub bank_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Personal wallet debited by personal transfers.
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
listen = "127.0.0.1:3000"

[rails]
base_url = "https://rails.example.com/"
api_key = "test-key"

[checkout]
return_url = "https://app.example.com/wallet"

[wire]
account_name = "Brand Wallet Inc."
account_number = "000123456789"
routing_number = "021000021"
bank_name = "Example Bank"

[operator]
user_id = "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c01"
"#;

    #[test]
    fn test_config_parsing() {
        let config: FileConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.rails.base_url.host_str(), Some("rails.example.com"));
        assert_eq!(config.rails.timeout_secs, 30);
        assert_eq!(config.checkout.return_url.path(), "/wallet");
        assert_eq!(config.wire.bank_name, "Example Bank");
    }

    #[test]
    fn test_server_section_is_optional() {
        let without_server = SAMPLE.replace("[server]\nlisten = \"127.0.0.1:3000\"\n", "");
        let config: FileConfig = toml::from_str(&without_server).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
    }

    #[test]
    fn test_relative_return_url_is_rejected() {
        let relative = SAMPLE.replace("https://app.example.com/wallet", "/wallet");
        assert!(toml::from_str::<FileConfig>(&relative).is_err());
    }
}
