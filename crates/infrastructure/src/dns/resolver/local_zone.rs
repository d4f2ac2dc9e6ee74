use arc_swap::ArcSwap;
use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{
    Answer, AnswerFlags, Domain, DomainError, Query, Record, RecordClass, RecordData, RecordType,
    ResultCode, TtlSpec,
};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_ZONE_TTL: u32 = 3600;

/// Authoritative data for one origin.
#[derive(Debug, Clone)]
pub struct Zone {
    origin: Domain,
    soa: Record,
    records: FxHashMap<Domain, Vec<Record>>,
}

impl Zone {
    pub fn new(soa: Record) -> Result<Self, DomainError> {
        if soa.record_type() != RecordType::SOA {
            return Err(DomainError::InvalidRecordData(format!(
                "zone apex record must be SOA, got {}",
                soa.record_type()
            )));
        }
        let mut zone = Self {
            origin: soa.name().clone(),
            soa: soa.clone(),
            records: FxHashMap::default(),
        };
        zone.add_record(soa)?;
        Ok(zone)
    }

    pub fn add_record(&mut self, record: Record) -> Result<(), DomainError> {
        if !record.name().is_subdomain_of(&self.origin) {
            return Err(DomainError::InvalidRecordData(format!(
                "{} is outside zone {}",
                record.name(),
                self.origin
            )));
        }
        let records = self.records.entry(record.name().clone()).or_default();
        if !records.contains(&record) {
            records.push(record);
        }
        Ok(())
    }

    #[inline]
    pub fn origin(&self) -> &Domain {
        &self.origin
    }

    #[inline]
    pub fn soa(&self) -> &Record {
        &self.soa
    }

    pub fn records_at(&self, name: &Domain) -> Option<&[Record]> {
        self.records.get(name).map(Vec::as_slice)
    }

    /// NS records of the closest delegation point at or above `name`,
    /// excluding the apex.
    fn delegation_for(&self, name: &Domain) -> Option<Vec<Record>> {
        let mut cursor = Some(name.clone());
        while let Some(current) = cursor {
            if current == self.origin {
                return None;
            }
            if let Some(records) = self.records.get(&current) {
                let ns: Vec<Record> = records
                    .iter()
                    .filter(|r| r.record_type() == RecordType::NS)
                    .cloned()
                    .collect();
                if !ns.is_empty() {
                    return Some(ns);
                }
            }
            cursor = current.parent();
        }
        None
    }

    /// Address records the zone holds for the targets of `ns_records`.
    fn glue_for(&self, ns_records: &[Record]) -> Vec<Record> {
        ns_records
            .iter()
            .filter_map(Record::target)
            .filter_map(|target| self.records.get(target))
            .flatten()
            .filter(|r| r.ip_addr().is_some())
            .cloned()
            .collect()
    }

    fn answer(&self, query: &Query) -> Answer {
        let Some(records) = self.records_at(&query.domain) else {
            if let Some(delegation) = self.delegation_for(&query.domain) {
                return self.referral(delegation);
            }
            return Answer::builder()
                .result_code(ResultCode::NxDomain)
                .flag(AnswerFlags::AUTHORITATIVE)
                .authority(self.soa.clone())
                .build();
        };

        let class_matches = |r: &&Record| r.class().matches(query.class);
        let matching: Vec<Record> = records
            .iter()
            .filter(class_matches)
            .filter(|r| r.record_type().matches(query.record_type))
            .cloned()
            .collect();
        if !matching.is_empty() {
            return Answer::builder()
                .flag(AnswerFlags::AUTHORITATIVE)
                .answers(matching)
                .build();
        }

        if let Some(delegation) = self.delegation_for(&query.domain) {
            return self.referral(delegation);
        }

        let alias: Vec<Record> = records
            .iter()
            .filter(class_matches)
            .filter(|r| r.record_type() == RecordType::CNAME)
            .cloned()
            .collect();
        Answer::builder()
            .flag(AnswerFlags::AUTHORITATIVE)
            .answers(alias.iter().cloned())
            .authorities(alias.is_empty().then(|| self.soa.clone()))
            .build()
    }

    fn referral(&self, delegation: Vec<Record>) -> Answer {
        let glue = self.glue_for(&delegation);
        Answer::builder()
            .authorities(delegation)
            .additionals(glue)
            .build()
    }

    /// Parses master-file style text.
    ///
    /// Each line is `name [ttl] [class] type rdata`. `@` stands for the origin,
    /// names without a trailing dot are relative to it and a line starting with
    /// whitespace reuses the previous owner. `$TTL` sets the default TTL and
    /// `;` starts a comment. Names inside rdata must be fully qualified.
    pub fn parse(origin: &Domain, text: &str) -> Result<Self, DomainError> {
        let mut default_ttl = DEFAULT_ZONE_TTL;
        let mut previous_owner: Option<Domain> = None;
        let mut zone: Option<Zone> = None;
        let mut pending = Vec::new();

        for (number, raw_line) in text.lines().enumerate() {
            let line = strip_comment(raw_line);
            if line.trim().is_empty() {
                continue;
            }
            let at_line = |e: DomainError| {
                DomainError::InvalidRecordData(format!("line {}: {}", number + 1, e))
            };

            if let Some(rest) = line.trim_start().strip_prefix("$TTL") {
                default_ttl = rest.trim().parse().map_err(|_| {
                    DomainError::InvalidRecordData(format!("line {}: bad $TTL", number + 1))
                })?;
                continue;
            }

            let (owner, rest) = if line.starts_with(char::is_whitespace) {
                let owner = previous_owner.clone().ok_or_else(|| {
                    DomainError::InvalidRecordData(format!(
                        "line {}: missing owner name",
                        number + 1
                    ))
                })?;
                (owner, line)
            } else {
                let (token, rest) = next_field(line);
                (resolve_name(origin, token).map_err(at_line)?, rest)
            };

            let (mut token, mut rest) = next_field(rest);
            let mut ttl = default_ttl;
            if let Ok(value) = token.parse::<u32>() {
                ttl = value;
                (token, rest) = next_field(rest);
            }
            let mut class = RecordClass::IN;
            if let Ok(value) = RecordClass::from_str(token) {
                class = value;
                (token, rest) = next_field(rest);
            }
            let record_type = RecordType::from_str(token)
                .map_err(|e| at_line(DomainError::InvalidRecordData(e)))?;

            let record = Record::from_text(
                owner.clone(),
                class,
                TtlSpec::Fixed(ttl),
                record_type,
                rest.trim(),
            )
            .map_err(at_line)?;
            previous_owner = Some(owner);

            let is_apex_soa =
                matches!(record.data(), RecordData::Soa(_)) && record.name() == origin;
            match zone.as_mut() {
                Some(zone) => zone.add_record(record).map_err(at_line)?,
                None if is_apex_soa => zone = Some(Zone::new(record)?),
                None => pending.push(record),
            }
        }

        let mut zone = zone.ok_or_else(|| {
            DomainError::InvalidRecordData(format!(
                "zone {} has no SOA record at its origin",
                origin
            ))
        })?;
        for record in pending {
            zone.add_record(record)?;
        }
        Ok(zone)
    }

    pub fn from_file(origin: &Domain, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(origin, &text)
    }
}

fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

fn next_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], &s[end..]),
        None => (s, ""),
    }
}

fn resolve_name(origin: &Domain, token: &str) -> Result<Domain, DomainError> {
    if token == "@" {
        return Ok(origin.clone());
    }
    let name: Domain = token.parse()?;
    if token.ends_with('.') && !token.ends_with("\\.") {
        return Ok(name);
    }
    Domain::from_labels(name.labels().iter().chain(origin.labels()).cloned())
}

/// Serves locally held zones; names outside every zone go to `next`.
pub struct LocalZoneResolver {
    zones: ArcSwap<FxHashMap<Domain, Arc<Zone>>>,
    next: Arc<dyn Resolver>,
}

impl LocalZoneResolver {
    pub fn new(next: Arc<dyn Resolver>) -> Self {
        Self {
            zones: ArcSwap::from_pointee(FxHashMap::default()),
            next,
        }
    }

    /// Replaces every zone at once.
    pub fn reload<I: IntoIterator<Item = Zone>>(&self, zones: I) {
        let zones: FxHashMap<Domain, Arc<Zone>> = zones
            .into_iter()
            .map(|zone| (zone.origin().clone(), Arc::new(zone)))
            .collect();
        info!(zones = zones.len(), "Local zones loaded");
        self.zones.store(Arc::new(zones));
    }

    pub fn zone_count(&self) -> usize {
        self.zones.load().len()
    }

    fn find_zone(&self, name: &Domain) -> Option<Arc<Zone>> {
        let zones = self.zones.load();
        let mut cursor = Some(name.clone());
        while let Some(current) = cursor {
            if let Some(zone) = zones.get(&current) {
                return Some(Arc::clone(zone));
            }
            cursor = current.parent();
        }
        None
    }
}

#[async_trait]
impl Resolver for LocalZoneResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        match self.find_zone(&query.domain) {
            Some(zone) => {
                let answer = zone.answer(query);
                debug!(
                    domain = %query.domain,
                    record_type = %query.record_type,
                    zone = %zone.origin(),
                    rcode = %answer.result_code(),
                    "Answered from local zone"
                );
                Ok(answer)
            }
            None => self.next.resolve(query).await,
        }
    }
}
