mod helpers;

use helpers::*;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{Answer, QueryFlags, RecordType, ResultCode, TtlSpec};
use meridian_dns_infrastructure::dns::resolver::{IterativeResolver, RootHintsResolver};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

fn referral_to_example_ns() -> Answer {
    Answer::builder()
        .authority(ns_record("example.com", "ns1.example.com"))
        .additional(a_record("ns1.example.com", [192, 0, 2, 1], TtlSpec::Fixed(3600)))
        .build()
}

fn server(ip: [u8; 4]) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip)), 53)
}

#[tokio::test]
async fn test_local_server_failure_terminates() {
    let local = Arc::new(MockResolver::new(Answer::with_code(ResultCode::ServerFailure)));
    let network = Arc::new(MockNetwork::new());
    let resolver = IterativeResolver::new(network.clone(), local.clone());

    let answer = resolver
        .resolve(&query("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(answer.result_code(), ResultCode::ServerFailure);
    assert_eq!(local.call_count(), 1);
    assert!(network.requested().is_empty());

    let asked = &local.queries()[0];
    assert_eq!(asked.domain, name("example.com"));
    assert_eq!(asked.record_type, RecordType::NS);
}

#[tokio::test]
async fn test_referral_with_glue_queries_glue_address() {
    let local = Arc::new(MockResolver::new(referral_to_example_ns()));
    let authority = Arc::new(MockResolver::new(a_answer("www.example.com", [203, 0, 113, 7])));
    let network = Arc::new(MockNetwork::new().with_server(server([192, 0, 2, 1]), authority.clone()));
    let resolver = IterativeResolver::new(network.clone(), local);

    let answer = resolver
        .resolve(&query("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(network.requested(), vec![server([192, 0, 2, 1])]);
    assert_eq!(answer.result_code(), ResultCode::NoError);
    assert_eq!(answer.answer_records().len(), 1);

    let sent = &authority.queries()[0];
    assert_eq!(sent.domain, name("www.example.com"));
    assert!(sent.has_flag(QueryFlags::NO_RECURSION));
}

#[tokio::test]
async fn test_referral_loop_is_bounded_by_hops() {
    let local = Arc::new(MockResolver::new(referral_to_example_ns()));
    let looping = Arc::new(MockResolver::new(referral_to_example_ns()));
    let network = Arc::new(MockNetwork::new().with_fallback(looping.clone()));
    let resolver = IterativeResolver::new(network.clone(), local).with_max_hops(4);

    let answer = resolver
        .resolve(&query("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(answer.result_code(), ResultCode::ServerFailure);
    assert_eq!(looping.call_count(), 3);
}

#[tokio::test]
async fn test_referral_without_glue_is_server_failure() {
    let local = Arc::new(MockResolver::new(
        Answer::builder()
            .authority(ns_record("example.com", "ns1.example.net"))
            .build(),
    ));
    let network = Arc::new(MockNetwork::new());
    let resolver = IterativeResolver::new(network.clone(), local);

    let answer = resolver
        .resolve(&query("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(answer.result_code(), ResultCode::ServerFailure);
    assert!(network.requested().is_empty());
}

#[tokio::test]
async fn test_nxdomain_from_authority_is_returned() {
    let local = Arc::new(MockResolver::new(referral_to_example_ns()));
    let authority = Arc::new(MockResolver::new(Answer::with_code(ResultCode::NxDomain)));
    let network = Arc::new(MockNetwork::new().with_fallback(authority));
    let resolver = IterativeResolver::new(network, local);

    let answer = resolver
        .resolve(&query("missing.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(answer.result_code(), ResultCode::NxDomain);
}

#[tokio::test]
async fn test_root_or_no_recursion_is_nxdomain_without_lookup() {
    let local = Arc::new(MockResolver::new(referral_to_example_ns()));
    let resolver = IterativeResolver::new(Arc::new(MockNetwork::new()), local.clone());

    let root = resolver.resolve(&query(".", RecordType::NS)).await.unwrap();
    assert_eq!(root.result_code(), ResultCode::NxDomain);

    let no_recursion = query("www.example.com", RecordType::A).with_flags(QueryFlags::NO_RECURSION);
    let answer = resolver.resolve(&no_recursion).await.unwrap();
    assert_eq!(answer.result_code(), ResultCode::NxDomain);

    assert_eq!(local.call_count(), 0);
}

#[tokio::test]
async fn test_walks_down_from_root_hints() {
    let roots = RootHintsResolver::new([(name("a.root-servers.net"), IpAddr::V4(Ipv4Addr::new(198, 41, 0, 4)))]);
    let com_referral = Answer::builder()
        .authority(ns_record("com", "a.gtld-servers.net"))
        .additional(a_record("a.gtld-servers.net", [192, 5, 6, 30], TtlSpec::Fixed(3600)))
        .build();
    let network = Arc::new(
        MockNetwork::new()
            .with_server(server([198, 41, 0, 4]), Arc::new(MockResolver::new(com_referral)))
            .with_server(server([192, 5, 6, 30]), Arc::new(MockResolver::new(referral_to_example_ns())))
            .with_server(
                server([192, 0, 2, 1]),
                Arc::new(MockResolver::new(a_answer("www.example.com", [203, 0, 113, 7]))),
            ),
    );
    let resolver = IterativeResolver::new(network.clone(), Arc::new(roots));

    let answer = resolver
        .resolve(&query("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(answer.answer_records().len(), 1);
    assert_eq!(
        network.requested(),
        vec![server([198, 41, 0, 4]), server([192, 5, 6, 30]), server([192, 0, 2, 1])]
    );
}

#[tokio::test]
async fn test_dropping_lookup_cancels_outstanding_referral_query() {
    let local = Arc::new(MockResolver::new(referral_to_example_ns()));
    let authority = Arc::new(
        MockResolver::new(a_answer("www.example.com", [203, 0, 113, 7]))
            .with_delay(Duration::from_millis(200)),
    );
    let network = Arc::new(MockNetwork::new().with_server(server([192, 0, 2, 1]), authority.clone()));
    let resolver = IterativeResolver::new(network, local);

    let result = tokio::time::timeout(
        Duration::from_millis(30),
        resolver.resolve(&query("www.example.com", RecordType::A)),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(authority.call_count(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(authority.completed_count(), 0);
}
