use super::Resolver;
use async_trait::async_trait;
use meridian_dns_domain::{
    Answer, Domain, DomainError, Query, RecordData, RecordType, ResultCode,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn checked(answer: Answer) -> Result<Answer, DomainError> {
    match answer.result_code() {
        ResultCode::NoError => Ok(answer),
        code => Err(DomainError::Dns(code)),
    }
}

pub fn addresses(answer: &Answer) -> Vec<IpAddr> {
    answer
        .answer_records()
        .iter()
        .filter_map(|r| r.ip_addr())
        .collect()
}

pub fn ipv4_addresses(answer: &Answer) -> Vec<Ipv4Addr> {
    answer
        .answer_records()
        .iter()
        .filter_map(|r| match r.data() {
            RecordData::A(v4) => Some(*v4),
            _ => None,
        })
        .collect()
}

pub fn ipv6_addresses(answer: &Answer) -> Vec<Ipv6Addr> {
    answer
        .answer_records()
        .iter()
        .filter_map(|r| match r.data() {
            RecordData::Aaaa(v6) => Some(*v6),
            _ => None,
        })
        .collect()
}

pub fn first_pointer_target(answer: &Answer) -> Option<Domain> {
    answer.answer_records().iter().find_map(|r| match r.data() {
        RecordData::Ptr(target) => Some(target.clone()),
        _ => None,
    })
}

/// One string per TXT record, its character-strings concatenated.
pub fn text_strings(answer: &Answer) -> Vec<String> {
    answer
        .answer_records()
        .iter()
        .filter_map(|r| match r.data() {
            RecordData::Txt(strings) => Some(String::from_utf8_lossy(&strings.concat()).into_owned()),
            _ => None,
        })
        .collect()
}

/// Typed lookups derived from [`Resolver::resolve`], available on every resolver.
///
/// A non-NOERROR answer becomes `DomainError::Dns(code)` here and only here.
#[async_trait]
pub trait ResolverExt: Resolver {
    async fn resolve_all_inet(&self, name: &Domain) -> Result<Vec<IpAddr>, DomainError> {
        let answer = self.resolve(&Query::new(name.clone(), RecordType::ANY)).await?;
        Ok(addresses(&checked(answer)?))
    }

    async fn resolve_inet(&self, name: &Domain) -> Result<Option<IpAddr>, DomainError> {
        Ok(self.resolve_all_inet(name).await?.into_iter().next())
    }

    async fn resolve_all_inet4(&self, name: &Domain) -> Result<Vec<Ipv4Addr>, DomainError> {
        let answer = self.resolve(&Query::new(name.clone(), RecordType::A)).await?;
        Ok(ipv4_addresses(&checked(answer)?))
    }

    async fn resolve_inet4(&self, name: &Domain) -> Result<Option<Ipv4Addr>, DomainError> {
        Ok(self.resolve_all_inet4(name).await?.into_iter().next())
    }

    async fn resolve_all_inet6(&self, name: &Domain) -> Result<Vec<Ipv6Addr>, DomainError> {
        let answer = self.resolve(&Query::new(name.clone(), RecordType::AAAA)).await?;
        Ok(ipv6_addresses(&checked(answer)?))
    }

    async fn resolve_inet6(&self, name: &Domain) -> Result<Option<Ipv6Addr>, DomainError> {
        Ok(self.resolve_all_inet6(name).await?.into_iter().next())
    }

    async fn resolve_reverse(&self, addr: IpAddr) -> Result<Option<Domain>, DomainError> {
        let query = Query::new(Domain::reverse_arpa(addr), RecordType::PTR);
        let answer = self.resolve(&query).await?;
        Ok(first_pointer_target(&checked(answer)?))
    }

    async fn resolve_text(&self, name: &Domain) -> Result<Vec<String>, DomainError> {
        let answer = self.resolve(&Query::new(name.clone(), RecordType::TXT)).await?;
        Ok(text_strings(&checked(answer)?))
    }
}

#[async_trait]
impl<R: Resolver + ?Sized> ResolverExt for R {}
