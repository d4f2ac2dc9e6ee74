use arc_swap::ArcSwap;
use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{
    Answer, Domain, DomainError, Query, Record, RecordClass, RecordType, TtlSpec,
};
use rustc_hash::FxHashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type HostsTable = FxHashMap<Domain, Vec<IpAddr>>;

/// Parses hosts-file text: `address name [aliases...]`, `#` starts a comment.
/// Lines with an unparsable address or name are skipped.
pub fn parse_hosts(content: &str) -> HostsTable {
    let mut table = HostsTable::default();
    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let Some(address) = fields.next() else {
            continue;
        };
        let ip: IpAddr = match address.parse() {
            Ok(ip) => ip,
            Err(_) => {
                warn!(line = number + 1, address, "Skipping hosts entry with invalid address");
                continue;
            }
        };
        for host in fields {
            match host.parse::<Domain>() {
                Ok(name) => {
                    let addresses = table.entry(name).or_default();
                    if !addresses.contains(&ip) {
                        addresses.push(ip);
                    }
                }
                Err(e) => warn!(line = number + 1, host, error = %e, "Skipping invalid host name"),
            }
        }
    }
    table
}

/// Answers address queries from a hosts table, forwarding unknown names.
pub struct HostsResolver {
    table: ArcSwap<HostsTable>,
    next: Arc<dyn Resolver>,
}

impl HostsResolver {
    pub fn new(next: Arc<dyn Resolver>) -> Self {
        Self {
            table: ArcSwap::from_pointee(HostsTable::default()),
            next,
        }
    }

    /// Replaces the whole table at once; in-flight lookups keep the old one.
    pub fn reload(&self, table: HostsTable) {
        info!(names = table.len(), "Hosts table loaded");
        self.table.store(Arc::new(table));
    }

    pub fn reload_from_str(&self, content: &str) {
        self.reload(parse_hosts(content));
    }

    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.reload_from_str(&content);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Resolver for HostsResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        if RecordClass::IN.matches(query.class) {
            let table = self.table.load();
            if let Some(addresses) = table.get(&query.domain) {
                debug!(
                    domain = %query.domain,
                    record_type = %query.record_type,
                    "Answered from hosts table"
                );
                let records = addresses
                    .iter()
                    .filter(|ip| match ip {
                        IpAddr::V4(_) => RecordType::A.matches(query.record_type),
                        IpAddr::V6(_) => RecordType::AAAA.matches(query.record_type),
                    })
                    .map(|ip| {
                        Record::address(query.domain.clone(), RecordClass::IN, TtlSpec::ZERO, *ip)
                    });
                return Ok(Answer::builder().answers(records).build());
            }
        }
        self.next.resolve(query).await
    }
}
