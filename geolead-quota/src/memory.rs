//! In-process quota counters.
//!
//! Same contract as the Redis backend, scoped to one process. Suitable for
//! tests and single-instance deployments; it is selected explicitly at
//! startup and is never a fallback when a shared store is configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::key::QuotaKey;
use crate::store::{QuotaConsumption, QuotaStore};

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u32,
    expires_at: Instant,
}

/// Mutex-guarded counter map with lazy expiry.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get_usage(&self, key: &QuotaKey) -> Result<u32> {
        let storage_key = key.storage_key();
        let mut entries = self.entries.lock();
        match entries.get(&storage_key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.count),
            Some(_) => {
                entries.remove(&storage_key);
                Ok(0)
            }
            None => Ok(0),
        }
    }

    async fn check_and_consume(
        &self,
        key: &QuotaKey,
        limit: u32,
        ttl: Duration,
    ) -> Result<QuotaConsumption> {
        let storage_key = key.storage_key();
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let live = entries
            .get(&storage_key)
            .copied()
            .filter(|entry| entry.expires_at > now);

        let (count, expires_at) = match live {
            Some(entry) if entry.count >= limit => {
                return Ok(QuotaConsumption {
                    allowed: false,
                    remaining: 0,
                });
            }
            // TTL carries over from first use; increments never extend it.
            Some(entry) => (entry.count + 1, entry.expires_at),
            None if limit == 0 => {
                return Ok(QuotaConsumption {
                    allowed: false,
                    remaining: 0,
                });
            }
            None => (1, now + ttl),
        };

        entries.insert(storage_key, CounterEntry { count, expires_at });
        Ok(QuotaConsumption {
            allowed: true,
            remaining: limit.saturating_sub(count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geolead_core::CallerId;
    use std::sync::Arc;

    const DAY: Duration = Duration::from_secs(86_400);

    fn key(name: &str) -> QuotaKey {
        QuotaKey::for_day_of(CallerId::parse(name).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn consume_walks_counter_to_limit() {
        let store = MemoryQuotaStore::new();
        let key = key("caller-one");

        for expected_remaining in (0..3).rev() {
            let outcome = store.check_and_consume(&key, 3, DAY).await.unwrap();
            assert!(outcome.allowed);
            assert_eq!(outcome.remaining, expected_remaining);
        }

        let denied = store.check_and_consume(&key, 3, DAY).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(store.get_usage(&key).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn usage_is_zero_for_absent_key() {
        let store = MemoryQuotaStore::new();
        assert_eq!(store.get_usage(&key("caller-unseen")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_limit_denies_first_request() {
        let store = MemoryQuotaStore::new();
        let outcome = store
            .check_and_consume(&key("caller-zero"), 0, DAY)
            .await
            .unwrap();
        assert!(!outcome.allowed);
        assert_eq!(store.get_usage(&key("caller-zero")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counter_expires_and_cycle_restarts() {
        let store = MemoryQuotaStore::new();
        let key = key("caller-ttl");
        let ttl = Duration::from_millis(20);

        let first = store.check_and_consume(&key, 1, ttl).await.unwrap();
        assert!(first.allowed);
        assert!(!store.check_and_consume(&key, 1, ttl).await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get_usage(&key).await.unwrap(), 0);
        assert!(store.check_and_consume(&key, 1, ttl).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn concurrent_consumes_grant_exactly_one_unit() {
        let store = Arc::new(MemoryQuotaStore::new());
        let key = key("caller-race");

        let attempts = (0..16).map(|_| {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move { store.check_and_consume(&key, 1, DAY).await.unwrap() })
        });

        let outcomes = futures::future::join_all(attempts).await;
        let granted = outcomes
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|o| o.allowed)
            .count();
        assert_eq!(granted, 1);
        assert_eq!(store.get_usage(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn keys_partition_by_caller() {
        let store = MemoryQuotaStore::new();
        store
            .check_and_consume(&key("caller-left"), 2, DAY)
            .await
            .unwrap();
        assert_eq!(store.get_usage(&key("caller-left")).await.unwrap(), 1);
        assert_eq!(store.get_usage(&key("caller-right")).await.unwrap(), 0);
    }
}
