use meridian_dns_domain::{Domain, Query, RecordClass, RecordType};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Cache key for a (domain, class, type) triple, hash computed once up front.
#[derive(Clone, Debug, Eq)]
pub struct RecordIdentifier {
    domain: Domain,
    class: RecordClass,
    record_type: RecordType,
    hash: u64,
}

impl RecordIdentifier {
    pub fn new(domain: Domain, class: RecordClass, record_type: RecordType) -> Self {
        let mut hasher = FxHasher::default();
        domain.hash(&mut hasher);
        class.hash(&mut hasher);
        record_type.hash(&mut hasher);
        Self {
            domain,
            class,
            record_type,
            hash: hasher.finish(),
        }
    }

    /// Flags do not take part in the key.
    pub fn from_query(query: &Query) -> Self {
        Self::new(query.domain.clone(), query.class, query.record_type)
    }

    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[inline]
    pub fn class(&self) -> RecordClass {
        self.class
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }
}

impl Hash for RecordIdentifier {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for RecordIdentifier {
    #[inline]
    fn eq(&self, other: &RecordIdentifier) -> bool {
        self.hash == other.hash
            && self.record_type == other.record_type
            && self.class == other.class
            && self.domain == other.domain
    }
}
