use crate::errors::DomainError;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// A single label of a domain name. Compares and hashes ASCII case-insensitively.
#[derive(Clone, Debug)]
pub struct Label(Arc<[u8]>);

impl Label {
    pub fn new(bytes: &[u8]) -> Result<Self, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::invalid_name(0, "empty label"));
        }
        if bytes.len() > MAX_LABEL_LEN {
            return Err(DomainError::invalid_name(
                MAX_LABEL_LEN,
                format!("label exceeds {} octets", MAX_LABEL_LEN),
            ));
        }
        Ok(Self(Arc::from(bytes)))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn lowercase(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().map(u8::to_ascii_lowercase)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        for b in self.lowercase() {
            state.write_u8(b);
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lowercase().cmp(other.lowercase())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter() {
            match b {
                b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                0x21..=0x7e => write!(f, "{}", b as char)?,
                _ => write!(f, "\\{:03}", b)?,
            }
        }
        Ok(())
    }
}

/// An immutable, absolute domain name stored as its label sequence, leftmost label first.
///
/// Equality, hashing and ordering ignore ASCII case. Ordering follows the
/// canonical DNS order (labels compared from the root side).
#[derive(Clone, Debug)]
pub struct Domain {
    labels: SmallVec<[Label; 4]>,
}

impl Domain {
    pub fn root() -> Self {
        Self {
            labels: SmallVec::new(),
        }
    }

    /// Builds a name from labels, checking the 255 octet wire limit.
    pub fn from_labels<I>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = Label>,
    {
        let domain = Self {
            labels: labels.into_iter().collect(),
        };
        let wire_len = domain.wire_len();
        if wire_len > MAX_NAME_LEN {
            return Err(DomainError::invalid_name(
                wire_len,
                format!("name exceeds {} octets", MAX_NAME_LEN),
            ));
        }
        Ok(domain)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Uncompressed wire length, including the terminating zero octet.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    pub fn parent(&self) -> Option<Domain> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            labels: self.labels[1..].iter().cloned().collect(),
        })
    }

    /// Prepends one label given in presentation form (escapes allowed, no dots).
    pub fn child(&self, label: &str) -> Result<Domain, DomainError> {
        let parsed: Domain = label.parse()?;
        if parsed.label_count() != 1 {
            return Err(DomainError::invalid_name(0, "expected exactly one label"));
        }
        let mut labels = parsed.labels;
        labels.extend(self.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// True when `self` equals `other` or lies below it.
    pub fn is_subdomain_of(&self, other: &Domain) -> bool {
        let (mine, theirs) = (self.labels.len(), other.labels.len());
        mine >= theirs && self.labels[mine - theirs..] == other.labels[..]
    }

    /// The `in-addr.arpa` / `ip6.arpa` name used for reverse lookups of `addr`.
    pub fn reverse_arpa(addr: IpAddr) -> Domain {
        let mut labels: SmallVec<[Label; 4]> = SmallVec::new();
        match addr {
            IpAddr::V4(v4) => {
                for octet in v4.octets().iter().rev() {
                    labels.push(Label(Arc::from(octet.to_string().as_bytes())));
                }
                labels.push(Label(Arc::from(&b"in-addr"[..])));
            }
            IpAddr::V6(v6) => {
                for octet in v6.octets().iter().rev() {
                    for nibble in [octet & 0x0f, octet >> 4] {
                        labels.push(Label(Arc::from(format!("{:x}", nibble).as_bytes())));
                    }
                }
                labels.push(Label(Arc::from(&b"ip6"[..])));
            }
        }
        labels.push(Label(Arc::from(&b"arpa"[..])));
        Self { labels }
    }

    pub fn is_reverse_arpa(&self) -> bool {
        self.reverse_arpa_address().is_some()
    }

    /// Inverse of [`Domain::reverse_arpa`].
    pub fn reverse_arpa_address(&self) -> Option<IpAddr> {
        let n = self.labels.len();
        if n < 2 || !self.labels[n - 1].as_bytes().eq_ignore_ascii_case(b"arpa") {
            return None;
        }
        let zone = self.labels[n - 2].as_bytes();
        let body = &self.labels[..n - 2];
        if zone.eq_ignore_ascii_case(b"in-addr") && body.len() == 4 {
            let mut octets = [0u8; 4];
            for (i, label) in body.iter().rev().enumerate() {
                octets[i] = std::str::from_utf8(label.as_bytes()).ok()?.parse().ok()?;
            }
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        } else if zone.eq_ignore_ascii_case(b"ip6") && body.len() == 32 {
            let mut octets = [0u8; 16];
            for (i, pair) in body.rchunks(2).enumerate() {
                let low = nibble(&pair[0])?;
                let high = nibble(&pair[1])?;
                octets[i] = (high << 4) | low;
            }
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        } else {
            None
        }
    }
}

fn nibble(label: &Label) -> Option<u8> {
    match label.as_bytes() {
        [c] => (*c as char).to_digit(16).map(|d| d as u8),
        _ => None,
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Domain {}

impl Hash for Domain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.labels.len());
        for label in &self.labels {
            label.hash(state);
        }
    }
}

impl PartialOrd for Domain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Domain {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels.iter().rev().cmp(other.labels.iter().rev())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", label)?;
        }
        Ok(())
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Domain::root());
        }

        let mut labels: SmallVec<[Label; 4]> = SmallVec::new();
        let mut current: Vec<u8> = Vec::with_capacity(MAX_LABEL_LEN);
        let mut chars = s.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() {
                        return Err(DomainError::invalid_name(pos, "empty label"));
                    }
                    labels.push(Label(Arc::from(current.as_slice())));
                    current.clear();
                    continue;
                }
                '\\' => {
                    let (next_pos, next) = chars
                        .next()
                        .ok_or_else(|| DomainError::invalid_name(pos, "dangling escape"))?;
                    if let Some(first) = next.to_digit(10) {
                        let mut value = first;
                        for _ in 0..2 {
                            match chars.next() {
                                Some((_, d)) if d.is_ascii_digit() => {
                                    value = value * 10 + d.to_digit(10).unwrap_or(0);
                                }
                                Some((bad, _)) => {
                                    return Err(DomainError::invalid_name(
                                        bad,
                                        "escape requires three decimal digits",
                                    ))
                                }
                                None => {
                                    return Err(DomainError::invalid_name(
                                        s.len(),
                                        "truncated decimal escape",
                                    ))
                                }
                            }
                        }
                        if value > 255 {
                            return Err(DomainError::invalid_name(pos, "escape value above 255"));
                        }
                        current.push(value as u8);
                    } else if next.is_ascii() && !next.is_ascii_control() {
                        current.push(next as u8);
                    } else {
                        return Err(DomainError::invalid_name(
                            next_pos,
                            format!("invalid escaped character {:?}", next),
                        ));
                    }
                }
                c if c.is_ascii_graphic() => current.push(c as u8),
                other => {
                    return Err(DomainError::invalid_name(
                        pos,
                        format!("invalid character {:?}", other),
                    ))
                }
            }

            if current.len() > MAX_LABEL_LEN {
                return Err(DomainError::invalid_name(
                    pos,
                    format!("label exceeds {} octets", MAX_LABEL_LEN),
                ));
            }
        }

        if !current.is_empty() {
            labels.push(Label(Arc::from(current.as_slice())));
        }

        Domain::from_labels(labels).map_err(|_| {
            DomainError::invalid_name(s.len(), format!("name exceeds {} octets", MAX_NAME_LEN))
        })
    }
}
