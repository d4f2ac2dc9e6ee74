use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::config::RootHint;
use meridian_dns_domain::{
    Answer, Domain, DomainError, Query, Record, RecordClass, RecordData, TtlSpec,
};
use std::net::IpAddr;
use tracing::info;

const ROOT_HINT_TTL: u32 = 518_400;

/// Answers every query with a referral to the root servers.
pub struct RootHintsResolver {
    referral: Answer,
}

impl RootHintsResolver {
    pub fn new<I>(servers: I) -> Self
    where
        I: IntoIterator<Item = (Domain, IpAddr)>,
    {
        let ttl = TtlSpec::Fixed(ROOT_HINT_TTL);
        let mut builder = Answer::builder();
        let mut count = 0usize;
        for (name, address) in servers {
            builder = builder
                .authority(Record::new(
                    Domain::root(),
                    RecordClass::IN,
                    ttl,
                    RecordData::Ns(name.clone()),
                ))
                .additional(Record::address(name, RecordClass::IN, ttl, address));
            count += 1;
        }
        info!(servers = count, "Root hints loaded");
        Self {
            referral: builder.build(),
        }
    }

    pub fn from_hints(hints: &[RootHint]) -> Result<Self, DomainError> {
        let servers = hints
            .iter()
            .map(|hint| {
                let name: Domain = hint.name.parse()?;
                let address: IpAddr = hint.address.parse().map_err(|_| {
                    DomainError::Config(format!(
                        "invalid root hint address {:?} for {}",
                        hint.address, hint.name
                    ))
                })?;
                Ok((name, address))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(Self::new(servers))
    }

    pub fn referral(&self) -> &Answer {
        &self.referral
    }
}

#[async_trait]
impl Resolver for RootHintsResolver {
    async fn resolve(&self, _query: &Query) -> Result<Answer, DomainError> {
        Ok(self.referral.clone())
    }
}
