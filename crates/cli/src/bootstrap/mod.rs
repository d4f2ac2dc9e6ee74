mod logging;

pub use logging::init_logging;

use meridian_dns_domain::config::{CliOverrides, Config};
use tracing::info;

pub fn load_config(config_path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(config_path, overrides)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    Ok(config)
}

pub fn log_config_summary(config: &Config) {
    info!(
        mode = ?config.resolver.mode,
        forward_server = config.resolver.forward_server.as_deref().unwrap_or("-"),
        root_hints = config.resolver.root_hints.len(),
        cache = config.cache.enabled,
        cache_entries = config.cache.max_entries,
        hosts = config.hosts.enabled,
        zones = config.zones.len(),
        "Configuration loaded"
    );
}
