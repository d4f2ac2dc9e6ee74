use meridian_dns_application::ports::{Resolver, ResolverExt};
use meridian_dns_domain::{
    Answer, Domain, DomainError, Record, RecordClass, RecordData, RecordType, ResultCode, TtlSpec,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

mod helpers;
use helpers::MockResolver;

fn name(s: &str) -> Domain {
    s.parse().unwrap()
}

fn record(owner: &str, data: RecordData) -> Record {
    Record::new(name(owner), RecordClass::IN, TtlSpec::Fixed(60), data)
}

fn mixed_answer() -> Answer {
    Answer::builder()
        .answer(record("host.example", RecordData::A(Ipv4Addr::new(192, 0, 2, 1))))
        .answer(record(
            "host.example",
            RecordData::Aaaa("2001:db8::1".parse::<Ipv6Addr>().unwrap()),
        ))
        .answer(record("host.example", RecordData::Cname(name("alias.example"))))
        .answer(record("host.example", RecordData::A(Ipv4Addr::new(192, 0, 2, 2))))
        .build()
}

#[tokio::test]
async fn test_resolve_all_inet_uses_any_and_keeps_both_families() {
    let mock = MockResolver::new(mixed_answer());

    let addrs = mock.resolve_all_inet(&name("host.example")).await.unwrap();

    assert_eq!(addrs.len(), 3);
    assert_eq!(addrs[0], IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
    assert_eq!(mock.last_query().unwrap().record_type, RecordType::ANY);
}

#[tokio::test]
async fn test_family_specific_lookups_filter_records() {
    let mock = MockResolver::new(mixed_answer());

    let v4 = mock.resolve_all_inet4(&name("host.example")).await.unwrap();
    assert_eq!(v4, vec![Ipv4Addr::new(192, 0, 2, 1), Ipv4Addr::new(192, 0, 2, 2)]);
    assert_eq!(mock.last_query().unwrap().record_type, RecordType::A);

    let v6 = mock.resolve_inet6(&name("host.example")).await.unwrap();
    assert_eq!(v6, Some("2001:db8::1".parse().unwrap()));
    assert_eq!(mock.last_query().unwrap().record_type, RecordType::AAAA);
}

#[tokio::test]
async fn test_empty_answer_yields_none() {
    let mock = MockResolver::new(Answer::builder().build());
    assert_eq!(mock.resolve_inet4(&name("host.example")).await.unwrap(), None);
}

#[tokio::test]
async fn test_non_noerror_becomes_dns_error() {
    let mock = MockResolver::new(Answer::with_code(ResultCode::NxDomain));

    let err = mock.resolve_all_inet(&name("missing.example")).await.unwrap_err();
    assert!(matches!(err, DomainError::Dns(ResultCode::NxDomain)));

    // The primitive itself reports the protocol outcome as a value.
    let query = meridian_dns_domain::Query::new(name("missing.example"), RecordType::A);
    let answer = mock.resolve(&query).await.unwrap();
    assert_eq!(answer.result_code(), ResultCode::NxDomain);
}

#[tokio::test]
async fn test_reverse_lookup_queries_arpa_name() {
    let answer = Answer::builder()
        .answer(record(
            "1.2.0.192.in-addr.arpa",
            RecordData::Ptr(name("host.example")),
        ))
        .build();
    let mock = MockResolver::new(answer);

    let target = mock
        .resolve_reverse("192.0.2.1".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(target, Some(name("host.example")));
    let query = mock.last_query().unwrap();
    assert_eq!(query.domain, name("1.2.0.192.in-addr.arpa"));
    assert_eq!(query.record_type, RecordType::PTR);
}

#[tokio::test]
async fn test_text_lookup_concatenates_strings() {
    let answer = Answer::builder()
        .answer(record(
            "example.com",
            RecordData::Txt(vec![b"v=spf1 ".to_vec(), b"-all".to_vec()]),
        ))
        .answer(record("example.com", RecordData::Txt(vec![b"second".to_vec()])))
        .build();
    let mock = MockResolver::new(answer);

    let texts = mock.resolve_text(&name("example.com")).await.unwrap();
    assert_eq!(texts, vec!["v=spf1 -all".to_string(), "second".to_string()]);
}

#[tokio::test]
async fn test_conveniences_work_through_trait_objects() {
    let resolver: Arc<dyn Resolver> = Arc::new(MockResolver::new(mixed_answer()));
    let first = resolver.resolve_inet(&name("host.example")).await.unwrap();
    assert_eq!(first, Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))));
}
