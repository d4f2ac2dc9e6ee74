use super::text::{self, Token};
use super::{RecordClass, RecordType};
use crate::domain_name::Domain;
use crate::errors::DomainError;
use crate::ttl::TtlSpec;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub mname: Domain,
    pub rname: Domain,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WksProtocol {
    Tcp,
    Udp,
    Other(u8),
}

impl WksProtocol {
    pub fn from_u8(value: u8) -> Self {
        match value {
            6 => WksProtocol::Tcp,
            17 => WksProtocol::Udp,
            other => WksProtocol::Other(other),
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            WksProtocol::Tcp => 6,
            WksProtocol::Udp => 17,
            WksProtocol::Other(value) => *value,
        }
    }
}

impl fmt::Display for WksProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WksProtocol::Tcp => f.write_str("TCP"),
            WksProtocol::Udp => f.write_str("UDP"),
            WksProtocol::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Type-specific payload of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(Domain),
    Ns(Domain),
    Ptr(Domain),
    Mx {
        preference: u16,
        exchange: Domain,
    },
    Soa(Soa),
    /// One or more character-strings.
    Txt(Vec<Vec<u8>>),
    Hinfo {
        cpu: Vec<u8>,
        os: Vec<u8>,
    },
    Wks {
        address: Ipv4Addr,
        protocol: WksProtocol,
        ports: Vec<u16>,
    },
    /// Opaque payload of a type without a dedicated decoder.
    Unknown {
        record_type: RecordType,
        data: Vec<u8>,
    },
}

impl RecordData {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::AAAA,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Ns(_) => RecordType::NS,
            RecordData::Ptr(_) => RecordType::PTR,
            RecordData::Mx { .. } => RecordType::MX,
            RecordData::Soa(_) => RecordType::SOA,
            RecordData::Txt(_) => RecordType::TXT,
            RecordData::Hinfo { .. } => RecordType::HINFO,
            RecordData::Wks { .. } => RecordType::WKS,
            RecordData::Unknown { record_type, .. } => *record_type,
        }
    }

    /// Parses record data in presentation form for `record_type`.
    pub fn from_text(record_type: RecordType, rdata: &str) -> Result<Self, DomainError> {
        if record_type.is_query_only() {
            return Err(DomainError::InvalidRecordData(format!(
                "{} is not a record type",
                record_type
            )));
        }

        let tokens = text::tokenize(rdata)?;
        if tokens.first().is_some_and(|t| t.raw == r"\#") {
            return Ok(RecordData::Unknown {
                record_type,
                data: parse_generic(tokens)?,
            });
        }

        let mut tokens = tokens.into_iter();
        let data = match record_type {
            RecordType::A => RecordData::A(parse_token(next_token(&mut tokens, "address")?)?),
            RecordType::AAAA => {
                RecordData::Aaaa(parse_token(next_token(&mut tokens, "address")?)?)
            }
            RecordType::CNAME => RecordData::Cname(parse_name(next_token(&mut tokens, "target")?)?),
            RecordType::NS => RecordData::Ns(parse_name(next_token(&mut tokens, "nameserver")?)?),
            RecordType::PTR => RecordData::Ptr(parse_name(next_token(&mut tokens, "target")?)?),
            RecordType::MX => RecordData::Mx {
                preference: parse_token(next_token(&mut tokens, "preference")?)?,
                exchange: parse_name(next_token(&mut tokens, "exchange")?)?,
            },
            RecordType::SOA => RecordData::Soa(Soa {
                mname: parse_name(next_token(&mut tokens, "mname")?)?,
                rname: parse_name(next_token(&mut tokens, "rname")?)?,
                serial: parse_token(next_token(&mut tokens, "serial")?)?,
                refresh: parse_token(next_token(&mut tokens, "refresh")?)?,
                retry: parse_token(next_token(&mut tokens, "retry")?)?,
                expire: parse_token(next_token(&mut tokens, "expire")?)?,
                minimum: parse_token(next_token(&mut tokens, "minimum")?)?,
            }),
            RecordType::TXT => {
                let strings = tokens
                    .by_ref()
                    .map(text::character_string)
                    .collect::<Result<Vec<_>, _>>()?;
                if strings.is_empty() {
                    return Err(DomainError::InvalidRecordData(
                        "TXT requires at least one string".to_string(),
                    ));
                }
                RecordData::Txt(strings)
            }
            RecordType::HINFO => RecordData::Hinfo {
                cpu: text::character_string(next_token(&mut tokens, "cpu")?)?,
                os: text::character_string(next_token(&mut tokens, "os")?)?,
            },
            RecordType::WKS => {
                let address = parse_token(next_token(&mut tokens, "address")?)?;
                let protocol = parse_wks_protocol(next_token(&mut tokens, "protocol")?)?;
                let mut ports = tokens
                    .by_ref()
                    .map(parse_token::<u16>)
                    .collect::<Result<Vec<_>, _>>()?;
                ports.sort_unstable();
                ports.dedup();
                RecordData::Wks {
                    address,
                    protocol,
                    ports,
                }
            }
            other => {
                return Err(DomainError::InvalidRecordData(format!(
                    "{} data must use the \\# generic form",
                    other
                )))
            }
        };

        if let Some(extra) = tokens.next() {
            return Err(DomainError::InvalidRecordData(format!(
                "unexpected trailing data {:?}",
                extra.raw
            )));
        }
        Ok(data)
    }
}

fn next_token(
    tokens: &mut impl Iterator<Item = Token>,
    field: &str,
) -> Result<Token, DomainError> {
    tokens
        .next()
        .ok_or_else(|| DomainError::InvalidRecordData(format!("missing {}", field)))
}

fn parse_token<T: std::str::FromStr>(token: Token) -> Result<T, DomainError> {
    token
        .raw
        .parse()
        .map_err(|_| DomainError::InvalidRecordData(format!("invalid value {:?}", token.raw)))
}

fn parse_name(token: Token) -> Result<Domain, DomainError> {
    token.raw.parse()
}

fn parse_wks_protocol(token: Token) -> Result<WksProtocol, DomainError> {
    match token.raw.to_ascii_uppercase().as_str() {
        "TCP" => Ok(WksProtocol::Tcp),
        "UDP" => Ok(WksProtocol::Udp),
        _ => parse_token::<u8>(token).map(WksProtocol::from_u8),
    }
}

/// `\# <length> <hex...>` per RFC 3597.
fn parse_generic(tokens: Vec<Token>) -> Result<Vec<u8>, DomainError> {
    let mut tokens = tokens.into_iter().skip(1);
    let length: usize = parse_token(next_token(&mut tokens, "length")?)?;
    let hex: String = tokens.map(|t| t.raw).collect();
    let data = text::parse_hex(&hex)?;
    if data.len() != length {
        return Err(DomainError::InvalidRecordData(format!(
            "generic data length {} does not match {} octets",
            length,
            data.len()
        )));
    }
    Ok(data)
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::Aaaa(addr) => write!(f, "{}", addr),
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => {
                write!(f, "{}", name)
            }
            RecordData::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RecordData::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RecordData::Txt(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    text::write_character_string(f, s)?;
                }
                Ok(())
            }
            RecordData::Hinfo { cpu, os } => {
                text::write_character_string(f, cpu)?;
                f.write_str(" ")?;
                text::write_character_string(f, os)
            }
            RecordData::Wks {
                address,
                protocol,
                ports,
            } => {
                write!(f, "{} {}", address, protocol)?;
                for port in ports {
                    write!(f, " {}", port)?;
                }
                Ok(())
            }
            RecordData::Unknown { data, .. } => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    f.write_str(" ")?;
                    for b in data {
                        write!(f, "{:02x}", b)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// A resource record: owner name, class, lifetime and typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    name: Domain,
    class: RecordClass,
    ttl: TtlSpec,
    data: RecordData,
}

impl Record {
    pub fn new(name: Domain, class: RecordClass, ttl: TtlSpec, data: RecordData) -> Self {
        Self {
            name,
            class,
            ttl,
            data,
        }
    }

    /// Builds a record from its presentation-form data.
    pub fn from_text(
        name: Domain,
        class: RecordClass,
        ttl: TtlSpec,
        record_type: RecordType,
        rdata: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(
            name,
            class,
            ttl,
            RecordData::from_text(record_type, rdata)?,
        ))
    }

    /// Address record for `ip`, A or AAAA depending on the family.
    pub fn address(name: Domain, class: RecordClass, ttl: TtlSpec, ip: IpAddr) -> Self {
        let data = match ip {
            IpAddr::V4(v4) => RecordData::A(v4),
            IpAddr::V6(v6) => RecordData::Aaaa(v6),
        };
        Self::new(name, class, ttl, data)
    }

    #[inline]
    pub fn name(&self) -> &Domain {
        &self.name
    }

    #[inline]
    pub fn class(&self) -> RecordClass {
        self.class
    }

    #[inline]
    pub fn ttl(&self) -> TtlSpec {
        self.ttl
    }

    #[inline]
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    pub fn with_ttl_spec(&self, ttl: TtlSpec) -> Record {
        Record {
            ttl,
            ..self.clone()
        }
    }

    pub fn is_expired_at(&self, now_millis: u64) -> bool {
        self.ttl.is_expired_at(now_millis)
    }

    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self.data {
            RecordData::A(v4) => Some(IpAddr::V4(v4)),
            RecordData::Aaaa(v6) => Some(IpAddr::V6(v6)),
            _ => None,
        }
    }

    /// Domain carried in the payload of CNAME, NS, PTR and MX records.
    pub fn target(&self) -> Option<&Domain> {
        match &self.data {
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => Some(name),
            RecordData::Mx { exchange, .. } => Some(exchange),
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.name,
            self.ttl.remaining(),
            self.class,
            self.record_type(),
            self.data
        )
    }
}
