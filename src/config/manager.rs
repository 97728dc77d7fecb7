//! Configuration Manager

use super::Config;
use crate::Result;
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config
                .validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(bind_addr) = std::env::var("USERMON_BIND_ADDR") {
            config.server.bind_addr = bind_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid USERMON_BIND_ADDR: {}", bind_addr))?;
        }

        if let Ok(timeout) = std::env::var("USERMON_SHUTDOWN_TIMEOUT") {
            config.server.shutdown_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid USERMON_SHUTDOWN_TIMEOUT: {}", timeout))?;
        }

        if let Ok(metrics_addr) = std::env::var("USERMON_METRICS_ADDR") {
            config.monitoring.bind_addr = metrics_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid USERMON_METRICS_ADDR: {}", metrics_addr))?;
        }

        if let Ok(metrics_enabled) = std::env::var("USERMON_METRICS_ENABLED") {
            config.monitoring.enabled = metrics_enabled
                .parse::<bool>()
                .with_context(|| format!("Invalid USERMON_METRICS_ENABLED: {}", metrics_enabled))?;
        }

        if let Ok(log_level) = std::env::var("USERMON_LOG_LEVEL") {
            config.monitoring.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_server_config()
            .with_context(|| "Server configuration validation failed")?;

        self.validate_monitoring_config()
            .with_context(|| "Monitoring configuration validation failed")?;

        self.validate_users()
            .with_context(|| "User configuration validation failed")?;

        Ok(())
    }

    fn validate_server_config(&self) -> Result<()> {
        if self.server.shutdown_timeout.as_secs() == 0 {
            bail!("shutdown_timeout must be greater than 0");
        }

        if self.server.shutdown_timeout.as_secs() > 300 {
            bail!("shutdown_timeout cannot exceed 5 minutes");
        }

        Ok(())
    }

    fn validate_monitoring_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.monitoring.log_level.as_str()) {
            bail!(
                "monitoring.log_level must be one of: {}",
                valid_log_levels.join(", ")
            );
        }

        // A shared address would let API traffic contend with scrapes.
        if self.monitoring.enabled && self.monitoring.bind_addr == self.server.bind_addr {
            bail!("monitoring.bind_addr must differ from server.bind_addr");
        }

        Ok(())
    }

    fn validate_users(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (i, user) in self.users.iter().enumerate() {
            if user.username.is_empty() {
                bail!("User {} has empty username", i);
            }

            if user.username.len() > 255 {
                bail!("User {} username exceeds 255 characters", i);
            }

            if user.password.is_empty() {
                bail!("User {} has empty password", i);
            }

            if user.password.len() > 255 {
                bail!("User {} password exceeds 255 characters", i);
            }

            if !seen.insert(user.username.as_str()) {
                bail!("Duplicate seed username: {}", user.username);
            }
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        bind: Option<&str>,
        port: Option<u16>,
        metrics_bind: Option<&str>,
        no_metrics: bool,
    ) {
        if let Some(bind_str) = bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(bind_str) = metrics_bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.monitoring.bind_addr = addr;
                tracing::info!("CLI override: metrics bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid metrics bind address provided: {}", bind_str);
            }
        }

        if no_metrics {
            self.monitoring.enabled = false;
            tracing::info!("CLI override: metrics exporter disabled");
        }
    }
}
