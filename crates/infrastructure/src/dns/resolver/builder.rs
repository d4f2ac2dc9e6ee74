use super::super::transport::{BufferPool, UdpChannelSource, UdpNetworkResolver};
use super::cache_layer::CachingResolver;
use super::core::IterativeResolver;
use super::empty::EmptyResolver;
use super::hosts::HostsResolver;
use super::local_zone::{LocalZoneResolver, Zone};
use super::root_hints::RootHintsResolver;
use super::system::SystemResolver;
use meridian_dns_application::ports::{NetworkResolver, Resolver};
use meridian_dns_domain::config::ResolutionMode;
use meridian_dns_domain::{Config, Domain, DomainError};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Assembles the resolver chain described by a [`Config`]:
/// hosts → local zones → cache → iterative | forwarding | system.
pub struct ResolverBuilder {
    runtime: Handle,
    config: Config,
    network: Option<Arc<dyn NetworkResolver>>,
}

impl ResolverBuilder {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            config: Config::default(),
            network: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Overrides the UDP network resolver built from the configuration.
    pub fn with_network(mut self, network: Arc<dyn NetworkResolver>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn build(self) -> Result<Arc<dyn Resolver>, DomainError> {
        let config = &self.config;
        info!(
            mode = ?config.resolver.mode,
            cache = config.cache.enabled,
            hosts = config.hosts.enabled,
            zones = config.zones.len(),
            "Building DNS resolver"
        );

        let network = match &self.network {
            Some(network) => Arc::clone(network),
            None => Arc::new(UdpNetworkResolver::new(
                Arc::new(
                    UdpChannelSource::new()
                        .with_recv_buffer_size(config.resolver.receive_buffer_size.max(4096)),
                ),
                BufferPool::new(
                    config.resolver.receive_buffer_size,
                    config.resolver.buffer_pool_size,
                ),
                self.runtime.clone(),
            )),
        };

        let mut resolver: Arc<dyn Resolver> = match config.resolver.mode {
            ResolutionMode::Iterative => {
                let roots = RootHintsResolver::from_hints(&config.resolver.root_hints)?;
                Arc::new(
                    IterativeResolver::new(network, Arc::new(roots))
                        .with_max_hops(config.resolver.max_hops)
                        .with_server_port(config.resolver.server_port),
                )
            }
            ResolutionMode::Forward => {
                let server = config
                    .forward_server_addr()
                    .map_err(|e| DomainError::Config(e.to_string()))?
                    .ok_or_else(|| {
                        DomainError::Config("forward mode requires resolver.forward_server".into())
                    })?;
                info!(server = %server, "Forwarding queries");
                network.resolver_for(server)
            }
            ResolutionMode::System => {
                Arc::new(SystemResolver::new(Arc::new(EmptyResolver::default())))
            }
        };

        if config.cache.enabled {
            resolver = Arc::new(CachingResolver::new(
                resolver,
                config.cache.max_entries,
                self.runtime.clone(),
            ));
        }

        if !config.zones.is_empty() {
            let mut zones = Vec::with_capacity(config.zones.len());
            for zone_config in &config.zones {
                let origin: Domain = zone_config.origin.parse()?;
                let zone = Zone::from_file(&origin, &zone_config.path).map_err(|e| {
                    DomainError::Config(format!("zone {} ({}): {}", origin, zone_config.path, e))
                })?;
                zones.push(zone);
            }
            let local = LocalZoneResolver::new(resolver);
            local.reload(zones);
            resolver = Arc::new(local);
        }

        if config.hosts.enabled {
            let hosts = HostsResolver::new(resolver);
            if let Err(e) = hosts.reload_from_file(&config.hosts.path) {
                warn!(path = %config.hosts.path, error = %e, "Hosts file not loaded");
            }
            resolver = Arc::new(hosts);
        }

        info!("DNS resolver built successfully");
        Ok(resolver)
    }
}
