//! Quota partition keys.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use geolead_core::CallerId;

/// Partition key for a quota counter: one caller, one UTC calendar day.
///
/// The day is baked into the storage key, so a new day means a new key and
/// the previous counter simply ages out through its TTL. Request handling
/// never deletes counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaKey {
    caller: CallerId,
    day: NaiveDate,
}

impl QuotaKey {
    pub fn new(caller: CallerId, day: NaiveDate) -> Self {
        QuotaKey { caller, day }
    }

    /// Key for the calendar day containing `now` (UTC).
    pub fn for_day_of(caller: CallerId, now: DateTime<Utc>) -> Self {
        QuotaKey {
            caller,
            day: now.date_naive(),
        }
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Key string used in the external store, `quota:{YYYYMMDD}:{caller}`.
    pub fn storage_key(&self) -> String {
        format!("quota:{}:{}", self.day.format("%Y%m%d"), self.caller)
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_key_embeds_day_and_caller() {
        let caller = CallerId::parse("anon-3f2a9c81").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 22, 15, 4, 5).unwrap();
        let key = QuotaKey::for_day_of(caller, now);
        assert_eq!(key.storage_key(), "quota:20260822:anon-3f2a9c81");
    }

    #[test]
    fn different_days_produce_different_keys() {
        let caller = CallerId::parse("anon-3f2a9c81").unwrap();
        let before_midnight = Utc.with_ymd_and_hms(2026, 8, 22, 23, 59, 59).unwrap();
        let after_midnight = Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap();
        let a = QuotaKey::for_day_of(caller.clone(), before_midnight);
        let b = QuotaKey::for_day_of(caller, after_midnight);
        assert_ne!(a.storage_key(), b.storage_key());
    }
}
