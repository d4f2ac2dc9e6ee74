use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{
    Answer, DomainError, Query, Record, RecordClass, RecordType, TtlSpec,
};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Asks the platform resolver for addresses.
///
/// Only A, AAAA and ANY in class IN are looked up; any other query is
/// answered NOERROR with no records. Names the platform cannot resolve are
/// passed to `next`.
pub struct SystemResolver {
    next: Arc<dyn Resolver>,
}

impl SystemResolver {
    pub fn new(next: Arc<dyn Resolver>) -> Self {
        Self { next }
    }

    fn wants_addresses(query: &Query) -> bool {
        RecordClass::IN.matches(query.class)
            && matches!(
                query.record_type,
                RecordType::A | RecordType::AAAA | RecordType::ANY
            )
            && !query.domain.is_root()
            && !query.domain.is_reverse_arpa()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        if !Self::wants_addresses(query) {
            return Ok(Answer::builder().build());
        }

        let host = query.domain.to_string();
        let addresses: Vec<IpAddr> = match tokio::net::lookup_host((host.as_str(), 0)).await {
            Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
            Err(e) => {
                debug!(
                    domain = %query.domain,
                    error = %e,
                    "Platform lookup failed, trying next resolver"
                );
                return self.next.resolve(query).await;
            }
        };

        let mut seen = Vec::with_capacity(addresses.len());
        for ip in addresses {
            let wanted = match ip {
                IpAddr::V4(_) => RecordType::A.matches(query.record_type),
                IpAddr::V6(_) => RecordType::AAAA.matches(query.record_type),
            };
            if wanted && !seen.contains(&ip) {
                seen.push(ip);
            }
        }
        debug!(domain = %query.domain, addresses = seen.len(), "Answered by platform resolver");

        let records = seen.into_iter().map(|ip| {
            Record::address(query.domain.clone(), RecordClass::IN, TtlSpec::ZERO, ip)
        });
        Ok(Answer::builder().answers(records).build())
    }
}
