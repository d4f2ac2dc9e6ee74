use crate::dns_record::Record;
use crate::ttl::now_millis;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    NoError,
    FormatError,
    ServerFailure,
    NxDomain,
    NotImplemented,
    Refused,
    Unknown,
}

impl ResultCode {
    pub fn from_u8(rcode: u8) -> Self {
        match rcode {
            0 => ResultCode::NoError,
            1 => ResultCode::FormatError,
            2 => ResultCode::ServerFailure,
            3 => ResultCode::NxDomain,
            4 => ResultCode::NotImplemented,
            5 => ResultCode::Refused,
            _ => ResultCode::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::NoError => "NOERROR",
            ResultCode::FormatError => "FORMAT_ERROR",
            ResultCode::ServerFailure => "SERVER_FAILURE",
            ResultCode::NxDomain => "NXDOMAIN",
            ResultCode::NotImplemented => "NOT_IMPLEMENTED",
            ResultCode::Refused => "REFUSED",
            ResultCode::Unknown => "UNKNOWN",
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        *self == ResultCode::NoError
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header bits carried on an [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnswerFlags(u8);

impl AnswerFlags {
    pub const NONE: AnswerFlags = AnswerFlags(0);
    pub const AUTHORITATIVE: AnswerFlags = AnswerFlags(1);
    pub const TRUNCATED: AnswerFlags = AnswerFlags(2);
    pub const RECURSION_DESIRED: AnswerFlags = AnswerFlags(4);
    pub const RECURSION_AVAILABLE: AnswerFlags = AnswerFlags(8);

    #[inline]
    pub fn contains(&self, other: AnswerFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AnswerFlags {
    type Output = AnswerFlags;

    fn bitor(self, rhs: AnswerFlags) -> AnswerFlags {
        AnswerFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for AnswerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (AnswerFlags::AUTHORITATIVE, "aa"),
            (AnswerFlags::TRUNCATED, "tc"),
            (AnswerFlags::RECURSION_DESIRED, "rd"),
            (AnswerFlags::RECURSION_AVAILABLE, "ra"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&set.join(" "))
    }
}

/// Immutable outcome of a resolution. Cloning is cheap: record sections are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    result_code: ResultCode,
    flags: AnswerFlags,
    answer: Arc<[Record]>,
    authority: Arc<[Record]>,
    additional: Arc<[Record]>,
}

impl Answer {
    pub fn builder() -> AnswerBuilder {
        AnswerBuilder::new()
    }

    /// An answer with no records, carrying only `code`.
    pub fn with_code(code: ResultCode) -> Self {
        AnswerBuilder::new().result_code(code).build()
    }

    #[inline]
    pub fn result_code(&self) -> ResultCode {
        self.result_code
    }

    #[inline]
    pub fn flags(&self) -> AnswerFlags {
        self.flags
    }

    #[inline]
    pub fn answer_records(&self) -> &[Record] {
        &self.answer
    }

    #[inline]
    pub fn authority_records(&self) -> &[Record] {
        &self.authority
    }

    #[inline]
    pub fn additional_records(&self) -> &[Record] {
        &self.additional
    }

    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(AnswerFlags::AUTHORITATIVE)
    }

    pub fn is_truncated(&self) -> bool {
        self.flags.contains(AnswerFlags::TRUNCATED)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
    }

    /// True while no record in any section has passed its end of life.
    pub fn is_unexpired_at(&self, now_millis: u64) -> bool {
        self.records().all(|r| !r.is_expired_at(now_millis))
    }

    pub fn is_unexpired(&self) -> bool {
        self.is_unexpired_at(now_millis())
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; status: {}, flags: {}", self.result_code, self.flags)?;
        let sections = [
            ("ANSWER", &self.answer),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ];
        for (title, records) in sections {
            if records.is_empty() {
                continue;
            }
            writeln!(f, "\n;; {} SECTION:", title)?;
            for record in records.iter() {
                writeln!(f, "{}", record)?;
            }
        }
        Ok(())
    }
}

/// Append-only builder; the only way to construct an [`Answer`].
#[derive(Debug, Default)]
pub struct AnswerBuilder {
    result_code: Option<ResultCode>,
    flags: AnswerFlags,
    answer: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
}

impl AnswerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_code(mut self, code: ResultCode) -> Self {
        self.result_code = Some(code);
        self
    }

    pub fn flag(mut self, flag: AnswerFlags) -> Self {
        self.flags = self.flags | flag;
        self
    }

    pub fn answer(mut self, record: Record) -> Self {
        self.answer.push(record);
        self
    }

    pub fn authority(mut self, record: Record) -> Self {
        self.authority.push(record);
        self
    }

    pub fn additional(mut self, record: Record) -> Self {
        self.additional.push(record);
        self
    }

    pub fn answers<I: IntoIterator<Item = Record>>(mut self, records: I) -> Self {
        self.answer.extend(records);
        self
    }

    pub fn authorities<I: IntoIterator<Item = Record>>(mut self, records: I) -> Self {
        self.authority.extend(records);
        self
    }

    pub fn additionals<I: IntoIterator<Item = Record>>(mut self, records: I) -> Self {
        self.additional.extend(records);
        self
    }

    /// Finalizes the answer. The result code defaults to NOERROR.
    pub fn build(self) -> Answer {
        Answer {
            result_code: self.result_code.unwrap_or(ResultCode::NoError),
            flags: self.flags,
            answer: self.answer.into(),
            authority: self.authority.into(),
            additional: self.additional.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_record::{RecordClass, RecordData};
    use crate::ttl::TtlSpec;
    use std::net::Ipv4Addr;

    fn a_record(ttl: TtlSpec) -> Record {
        Record::new(
            "example.com".parse().unwrap(),
            RecordClass::IN,
            ttl,
            RecordData::A(Ipv4Addr::new(192, 0, 2, 1)),
        )
    }

    #[test]
    fn test_builder_defaults_to_empty_noerror() {
        let answer = Answer::builder().build();
        assert_eq!(answer.result_code(), ResultCode::NoError);
        assert!(answer.answer_records().is_empty());
        assert!(answer.authority_records().is_empty());
        assert!(answer.additional_records().is_empty());
    }

    #[test]
    fn test_expiry_considers_every_section() {
        let answer = Answer::builder()
            .answer(a_record(TtlSpec::Fixed(0)))
            .additional(a_record(TtlSpec::Variable { eol_millis: 1_000 }))
            .build();
        assert!(answer.is_unexpired_at(999));
        assert!(!answer.is_unexpired_at(1_000));
    }

    #[test]
    fn test_rcode_mapping() {
        assert_eq!(ResultCode::from_u8(3), ResultCode::NxDomain);
        assert_eq!(ResultCode::from_u8(9), ResultCode::Unknown);
    }
}
