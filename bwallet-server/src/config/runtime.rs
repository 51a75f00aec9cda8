//! Runtime configuration built from the validated file configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct RailsConfig {
    pub base_url: Url,
    pub api_key: String,
    pub timeout: Duration,
}

/// The sections that SIGHUP can change without a restart.
///
/// Rails and the operator wallet are bound into long-lived clients at
/// startup and only change on restart.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    pub return_url: Arc<RwLock<Url>>,
}
