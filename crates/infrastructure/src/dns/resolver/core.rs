use async_trait::async_trait;
use meridian_dns_application::ports::{NetworkResolver, Resolver};
use meridian_dns_domain::{
    Answer, Domain, DomainError, Query, QueryFlags, RecordData, RecordType, ResultCode,
};
use rustc_hash::FxHashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MAX_HOPS: u32 = 16;
pub const DEFAULT_SERVER_PORT: u16 = 53;

/// Follows referrals from the closest known delegation down to an answer.
///
/// The starting point comes from `local`, asked for the NS records of the
/// queried name's parent. The builder passes root hints directly, so every
/// lookup starts at the root; referral data is not cached.
pub struct IterativeResolver {
    network: Arc<dyn NetworkResolver>,
    local: Arc<dyn Resolver>,
    max_hops: u32,
    server_port: u16,
}

impl IterativeResolver {
    pub fn new(network: Arc<dyn NetworkResolver>, local: Arc<dyn Resolver>) -> Self {
        info!(max_hops = DEFAULT_MAX_HOPS, "Iterative resolver created");
        Self {
            network,
            local,
            max_hops: DEFAULT_MAX_HOPS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }

    pub fn with_max_hops(mut self, max_hops: u32) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }
}

enum Step {
    Done(Answer),
    Referral(IpAddr),
}

/// Decides what a NOERROR response means for `query`.
fn next_step(query: &Query, response: Answer) -> Step {
    let no_data = response.is_authoritative() && !has_delegation(query, &response);
    if no_data || answers_query(query, &response) {
        return Step::Done(response);
    }
    match referral_candidates(&query.domain, &response).into_iter().next() {
        Some(server) => Step::Referral(server),
        None => Step::Done(Answer::with_code(ResultCode::ServerFailure)),
    }
}

fn answers_query(query: &Query, response: &Answer) -> bool {
    response.answer_records().iter().any(|r| {
        r.name() == &query.domain
            && r.class().matches(query.class)
            && (r.record_type().matches(query.record_type) || r.record_type() == RecordType::CNAME)
    })
}

fn has_delegation(query: &Query, response: &Answer) -> bool {
    response
        .authority_records()
        .iter()
        .any(|r| matches!(r.data(), RecordData::Ns(_)) && query.domain.is_subdomain_of(r.name()))
}

/// Glue addresses for every NS record that covers `domain`, in record order.
fn referral_candidates(domain: &Domain, response: &Answer) -> Vec<IpAddr> {
    let mut glue: FxHashMap<&Domain, IpAddr> = FxHashMap::default();
    for record in response.additional_records() {
        if let Some(ip) = record.ip_addr() {
            glue.entry(record.name()).or_insert(ip);
        }
    }

    let mut candidates = Vec::new();
    let delegations = response
        .answer_records()
        .iter()
        .chain(response.authority_records());
    for record in delegations {
        let RecordData::Ns(server) = record.data() else {
            continue;
        };
        if !domain.is_subdomain_of(record.name()) {
            continue;
        }
        if let Some(ip) = glue.get(server) {
            if !candidates.contains(ip) {
                candidates.push(*ip);
            }
        }
    }
    candidates
}

#[async_trait]
impl Resolver for IterativeResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        let parent = match query.domain.parent() {
            Some(parent) if !query.has_flag(QueryFlags::NO_RECURSION) => parent,
            _ => return Ok(Answer::with_code(ResultCode::NxDomain)),
        };

        let ns_query = Query::new(parent, RecordType::NS).with_class(query.class);
        let mut response = self.local.resolve(&ns_query).await?;
        let upstream_query = query.clone().with_flags(query.flags | QueryFlags::NO_RECURSION);
        let mut hops_left = self.max_hops;

        loop {
            if response.result_code() != ResultCode::NoError {
                return Ok(response);
            }

            hops_left = hops_left.saturating_sub(1);
            if hops_left == 0 {
                debug!(
                    domain = %query.domain,
                    max_hops = self.max_hops,
                    "Referral hop limit reached"
                );
                return Ok(Answer::with_code(ResultCode::ServerFailure));
            }

            let server = match next_step(query, response) {
                Step::Done(answer) => return Ok(answer),
                Step::Referral(ip) => SocketAddr::new(ip, self.server_port),
            };

            debug!(
                domain = %query.domain,
                record_type = %query.record_type,
                server = %server,
                hops_left,
                "Following referral"
            );
            response = self.network.resolver_for(server).resolve(&upstream_query).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_dns_domain::{Record, RecordClass, TtlSpec};
    use std::net::Ipv4Addr;

    fn name(s: &str) -> Domain {
        s.parse().unwrap()
    }

    fn ns(owner: &str, target: &str) -> Record {
        Record::new(
            name(owner),
            RecordClass::IN,
            TtlSpec::Fixed(0),
            RecordData::Ns(name(target)),
        )
    }

    fn glue(owner: &str, ip: [u8; 4]) -> Record {
        Record::address(
            name(owner),
            RecordClass::IN,
            TtlSpec::Fixed(0),
            IpAddr::V4(Ipv4Addr::from(ip)),
        )
    }

    #[test]
    fn test_candidates_skip_unrelated_and_unglued_servers() {
        let response = Answer::builder()
            .authority(ns("other.org", "ns.other.org"))
            .authority(ns("example.com", "ns0.example.net"))
            .authority(ns("example.com", "ns1.example.com"))
            .additional(glue("ns.other.org", [198, 51, 100, 1]))
            .additional(glue("ns1.example.com", [192, 0, 2, 1]))
            .additional(glue("ns1.example.com", [192, 0, 2, 99]))
            .build();

        let candidates = referral_candidates(&name("www.example.com"), &response);
        assert_eq!(candidates, vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))]);
    }

    #[test]
    fn test_cname_for_query_name_is_final() {
        let query = Query::new(name("www.example.com"), RecordType::A);
        let response = Answer::builder()
            .answer(Record::new(
                name("www.example.com"),
                RecordClass::IN,
                TtlSpec::Fixed(0),
                RecordData::Cname(name("web.example.net")),
            ))
            .build();
        assert!(matches!(next_step(&query, response), Step::Done(_)));
    }

    #[test]
    fn test_parent_ns_answer_is_treated_as_referral() {
        let query = Query::new(name("www.example.com"), RecordType::A);
        let response = Answer::builder()
            .answer(ns("example.com", "ns1.example.com"))
            .additional(glue("ns1.example.com", [192, 0, 2, 1]))
            .build();
        assert!(matches!(next_step(&query, response), Step::Referral(_)));
    }
}
