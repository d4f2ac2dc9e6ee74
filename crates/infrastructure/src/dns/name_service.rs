use super::resolver::EmptyResolver;
use arc_swap::ArcSwap;
use meridian_dns_application::ports::{Resolver, ResolverExt};
use meridian_dns_domain::{Domain, DomainError, ResultCode};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Host-name lookups for code that wants a plain name-service interface.
///
/// The resolver can be replaced at any time; each lookup uses whichever
/// resolver is current when it starts.
pub struct NameService {
    current: ArcSwap<Arc<dyn Resolver>>,
}

impl NameService {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            current: ArcSwap::from_pointee(resolver),
        }
    }

    pub fn set_current_resolver(&self, resolver: Arc<dyn Resolver>) {
        info!("Name service resolver replaced");
        self.current.store(Arc::new(resolver));
    }

    pub fn current_resolver(&self) -> Arc<dyn Resolver> {
        Arc::clone(&self.current.load())
    }

    /// Every address of `host_name`; an empty result is reported as NXDOMAIN.
    pub async fn lookup_all_host_addr(&self, host_name: &str) -> Result<Vec<IpAddr>, DomainError> {
        let name: Domain = host_name.parse()?;
        let resolver = self.current_resolver();
        let addresses = resolver.resolve_all_inet(&name).await?;
        debug!(host = host_name, addresses = addresses.len(), "Name service lookup");
        if addresses.is_empty() {
            return Err(DomainError::Dns(ResultCode::NxDomain));
        }
        Ok(addresses)
    }

    /// Host name registered for `address` through its reverse-arpa PTR record.
    pub async fn host_by_addr(&self, address: IpAddr) -> Result<String, DomainError> {
        let resolver = self.current_resolver();
        match resolver.resolve_reverse(address).await? {
            Some(name) => Ok(name.to_string()),
            None => Err(DomainError::Dns(ResultCode::NxDomain)),
        }
    }
}

impl Default for NameService {
    fn default() -> Self {
        Self::new(Arc::new(EmptyResolver::default()))
    }
}
