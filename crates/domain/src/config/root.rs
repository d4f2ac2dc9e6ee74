use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::local_data::{HostsConfig, ZoneConfig};
use super::logging::LoggingConfig;
use super::resolver::{ResolutionMode, ResolverConfig};

/// Main configuration structure for Meridian DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub hosts: HostsConfig,

    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. meridian-dns.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("meridian-dns.toml").exists() {
            Self::from_file("meridian-dns.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(server) = overrides.forward_server {
            self.resolver.forward_server = Some(server);
            self.resolver.mode = ResolutionMode::Forward;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(enabled) = overrides.hosts_enabled {
            self.hosts.enabled = enabled;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Address of the forwarding server, with `server_port` applied when none is given.
    pub fn forward_server_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        self.resolver
            .forward_server
            .as_deref()
            .map(|server| parse_server(server, self.resolver.server_port))
            .transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.mode == ResolutionMode::Forward && self.resolver.forward_server.is_none()
        {
            return Err(ConfigError::Validation(
                "Forward mode requires resolver.forward_server".to_string(),
            ));
        }

        self.forward_server_addr()?;

        if self.resolver.mode == ResolutionMode::Iterative && self.resolver.root_hints.is_empty() {
            return Err(ConfigError::Validation(
                "Iterative mode requires at least one root hint".to_string(),
            ));
        }

        for hint in &self.resolver.root_hints {
            hint.address.parse::<IpAddr>().map_err(|_| {
                ConfigError::Validation(format!(
                    "Root hint '{}' has invalid address '{}'",
                    hint.name, hint.address
                ))
            })?;
        }

        if self.resolver.max_hops == 0 {
            return Err(ConfigError::Validation(
                "resolver.max_hops must be at least 1".to_string(),
            ));
        }

        if self.resolver.receive_buffer_size < 512 {
            return Err(ConfigError::Validation(
                "resolver.receive_buffer_size must be at least 512".to_string(),
            ));
        }

        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache.max_entries cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_server(server: &str, default_port: u16) -> Result<SocketAddr, ConfigError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    server
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, default_port))
        .map_err(|_| ConfigError::Validation(format!("Invalid server address '{}'", server)))
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub forward_server: Option<String>,
    pub cache_enabled: Option<bool>,
    pub hosts_enabled: Option<bool>,
    pub log_level: Option<String>,
}
