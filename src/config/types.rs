//! Configuration Types

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Monitoring configuration
///
/// The metrics exporter listens on its own address, separate from API
/// traffic, so scrapes never contend with the service port.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub bind_addr: SocketAddr,
    pub log_level: String,
}

/// Seed user configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".parse().unwrap(),
                shutdown_timeout: Duration::from_secs(5),
            },
            monitoring: MonitoringConfig {
                enabled: true,
                bind_addr: "127.0.0.1:8081".parse().unwrap(),
                log_level: "info".to_string(),
            },
            users: vec![],
        }
    }
}
