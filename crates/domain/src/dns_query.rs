use crate::dns_record::{RecordClass, RecordType};
use crate::domain_name::Domain;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Per-query behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryFlags(u8);

impl QueryFlags {
    pub const NONE: QueryFlags = QueryFlags(0);
    /// Skip every cache on the way; neither read nor populate it.
    pub const BYPASS_CACHE: QueryFlags = QueryFlags(1);
    /// Ask the upstream not to recurse (RD bit clear) and stop iterative resolution.
    pub const NO_RECURSION: QueryFlags = QueryFlags(2);
    /// Accepted for compatibility; only the UDP transport exists.
    pub const USE_TCP: QueryFlags = QueryFlags(4);

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(&self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn without(self, other: QueryFlags) -> QueryFlags {
        QueryFlags(self.0 & !other.0)
    }
}

impl BitOr for QueryFlags {
    type Output = QueryFlags;

    fn bitor(self, rhs: QueryFlags) -> QueryFlags {
        QueryFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryFlags {
    fn bitor_assign(&mut self, rhs: QueryFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for QueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (QueryFlags::BYPASS_CACHE, "bypass-cache"),
            (QueryFlags::NO_RECURSION, "no-recursion"),
            (QueryFlags::USE_TCP, "use-tcp"),
        ];
        let mut first = true;
        for (flag, label) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(label)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// A single question: name, class, type plus behaviour flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub domain: Domain,
    pub class: RecordClass,
    pub record_type: RecordType,
    pub flags: QueryFlags,
}

impl Query {
    pub fn new(domain: Domain, record_type: RecordType) -> Self {
        Self {
            domain,
            class: RecordClass::IN,
            record_type,
            flags: QueryFlags::NONE,
        }
    }

    pub fn with_class(mut self, class: RecordClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn has_flag(&self, flag: QueryFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.domain, self.class, self.record_type, self.flags
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let flags = QueryFlags::BYPASS_CACHE | QueryFlags::NO_RECURSION;
        assert!(flags.contains(QueryFlags::BYPASS_CACHE));
        assert!(flags.contains(QueryFlags::NO_RECURSION));
        assert!(!flags.contains(QueryFlags::USE_TCP));
        assert_eq!(flags.without(QueryFlags::BYPASS_CACHE), QueryFlags::NO_RECURSION);
        assert_eq!(flags.to_string(), "bypass-cache,no-recursion");
    }
}
