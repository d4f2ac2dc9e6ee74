use meridian_dns_domain::{
    Answer, Domain, Query, Record, RecordClass, RecordData, RecordType, TtlSpec,
};
use meridian_dns_infrastructure::dns::codec::message::{FLAG_QR, FLAG_RA, FLAG_RD};
use meridian_dns_infrastructure::dns::codec::{read_name, WireReader};
use std::net::{IpAddr, Ipv4Addr};

pub fn name(s: &str) -> Domain {
    s.parse().unwrap()
}

pub fn query(domain: &str, record_type: RecordType) -> Query {
    Query::new(name(domain), record_type)
}

pub fn a_record(owner: &str, ip: [u8; 4], ttl: TtlSpec) -> Record {
    Record::address(
        name(owner),
        RecordClass::IN,
        ttl,
        IpAddr::V4(Ipv4Addr::from(ip)),
    )
}

pub fn ns_record(owner: &str, target: &str) -> Record {
    Record::new(
        name(owner),
        RecordClass::IN,
        TtlSpec::Fixed(3600),
        RecordData::Ns(name(target)),
    )
}

pub fn a_answer(owner: &str, ip: [u8; 4]) -> Answer {
    Answer::builder()
        .answer(a_record(owner, ip, TtlSpec::Fixed(300)))
        .build()
}

/// Header flags of an ordinary recursive response with `rcode`.
pub fn response_flags(rcode: u16) -> u16 {
    FLAG_QR | FLAG_RD | FLAG_RA | rcode
}

/// Transaction id and question of a query datagram.
pub fn parse_query(packet: &[u8]) -> (u16, Query) {
    let mut reader = WireReader::new(packet);
    let id = reader.read_u16().unwrap();
    reader.read_bytes(10).unwrap();
    let domain = read_name(&mut reader).unwrap();
    let record_type = RecordType::from_u16(reader.read_u16().unwrap());
    let class = RecordClass::from_u16(reader.read_u16().unwrap());
    (id, Query::new(domain, record_type).with_class(class))
}
