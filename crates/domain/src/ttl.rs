use std::time::{SystemTime, UNIX_EPOCH};

const MAX_REMAINING_TTL: u64 = i32::MAX as u64;

/// Wall clock in milliseconds since the Unix epoch.
#[inline]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Lifetime of a record.
///
/// `Fixed` records (hosts file, local zones, synthesized answers) report a
/// constant TTL and never expire. `Variable` records come off the wire and
/// carry the absolute end-of-life instant computed at packet receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlSpec {
    Fixed(u32),
    Variable { eol_millis: u64 },
}

impl TtlSpec {
    pub const ZERO: TtlSpec = TtlSpec::Fixed(0);

    pub fn from_receipt(received_at_millis: u64, ttl_secs: u32) -> Self {
        TtlSpec::Variable {
            eol_millis: received_at_millis.saturating_add(u64::from(ttl_secs) * 1000),
        }
    }

    /// Remaining seconds, clamped to `0..=i32::MAX`.
    pub fn remaining_at(&self, now_millis: u64) -> u32 {
        match *self {
            TtlSpec::Fixed(secs) => secs.min(MAX_REMAINING_TTL as u32),
            TtlSpec::Variable { eol_millis } => {
                (eol_millis.saturating_sub(now_millis) / 1000).min(MAX_REMAINING_TTL) as u32
            }
        }
    }

    pub fn is_expired_at(&self, now_millis: u64) -> bool {
        match *self {
            TtlSpec::Fixed(_) => false,
            TtlSpec::Variable { eol_millis } => now_millis >= eol_millis,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_at(now_millis())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }
}

impl Default for TtlSpec {
    fn default() -> Self {
        TtlSpec::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_never_expires() {
        let ttl = TtlSpec::Fixed(0);
        assert!(!ttl.is_expired_at(0));
        assert!(!ttl.is_expired_at(u64::MAX));
        assert_eq!(ttl.remaining_at(u64::MAX), 0);
    }

    #[test]
    fn test_variable_expires_at_eol() {
        let ttl = TtlSpec::Variable { eol_millis: 10_000 };
        assert!(!ttl.is_expired_at(9_999));
        assert!(ttl.is_expired_at(10_000));
        assert!(ttl.is_expired_at(10_001));
    }

    #[test]
    fn test_remaining_is_non_negative_and_non_increasing() {
        let ttl = TtlSpec::from_receipt(1_000, 5);
        let mut last = u32::MAX;
        for now in (0..10_000).step_by(250) {
            let remaining = ttl.remaining_at(now);
            assert!(remaining <= last);
            last = remaining;
        }
        assert_eq!(ttl.remaining_at(1_000), 5);
        assert_eq!(ttl.remaining_at(50_000), 0);
    }

    #[test]
    fn test_remaining_is_clamped_to_i32_max() {
        let ttl = TtlSpec::Variable { eol_millis: u64::MAX };
        assert_eq!(ttl.remaining_at(0), i32::MAX as u32);
    }
}
