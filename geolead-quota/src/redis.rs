//! Redis-backed quota counters.
//!
//! The check-and-consume step runs as a server-side Lua script, so the
//! limit comparison and the increment are one atomic unit no matter how
//! many process instances share the store. Every round trip carries a short
//! timeout; an elapsed timeout is reported like any other outage and the
//! request fails closed. The hot path never retries a quota operation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisResult, Script};
use tracing::info;

use crate::error::{QuotaError, Result};
use crate::key::QuotaKey;
use crate::store::{QuotaConsumption, QuotaStore};

/// Default per-operation timeout.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for the initial connection handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Atomic conditional increment.
///
/// KEYS[1] = counter key, ARGV[1] = limit, ARGV[2] = TTL seconds.
/// Returns {1, remaining} when a unit was consumed, {0, 0} when denied.
/// The comparison happens before the increment, so the counter never
/// exceeds the limit and a zero limit denies from the first request. The
/// TTL is attached when the counter is created; later increments leave the
/// expiry untouched.
const CONSUME_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
local limit = tonumber(ARGV[1])
if current >= limit then
    return {0, 0}
end
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[2]))
end
local remaining = limit - count
if remaining < 0 then
    remaining = 0
end
return {1, remaining}
"#;

/// Shared counter store on Redis.
///
/// Holds a self-reconnecting connection handle; cloned per operation, which
/// is cheap. Constructed once at startup and injected into the policy
/// layer; there are no ambient globals.
pub struct RedisQuotaStore {
    manager: ConnectionManager,
    script: Script,
    op_timeout: Duration,
}

impl fmt::Debug for RedisQuotaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisQuotaStore")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisQuotaStore {
    /// Connect with the default operation timeout.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_timeout(url, DEFAULT_OP_TIMEOUT).await
    }

    /// Connect with an explicit per-operation timeout.
    pub async fn connect_with_timeout(url: &str, op_timeout: Duration) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| QuotaError::unavailable(format!("invalid store url: {e}")))?;
        let manager = match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
        {
            Ok(Ok(manager)) => manager,
            Ok(Err(e)) => return Err(QuotaError::unavailable(e.to_string())),
            Err(_) => return Err(QuotaError::Timeout(CONNECT_TIMEOUT)),
        };
        info!(
            op_timeout_ms = op_timeout.as_millis() as u64,
            "quota store connected"
        );
        Ok(RedisQuotaStore {
            manager,
            script: Script::new(CONSUME_SCRIPT),
            op_timeout,
        })
    }

    async fn with_timeout<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(QuotaError::unavailable(e.to_string())),
            Err(_) => Err(QuotaError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn get_usage(&self, key: &QuotaKey) -> Result<u32> {
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key.storage_key());
        let raw: Option<String> = self.with_timeout(cmd.query_async(&mut conn)).await?;
        parse_counter(raw, key)
    }

    async fn check_and_consume(
        &self,
        key: &QuotaKey,
        limit: u32,
        ttl: Duration,
    ) -> Result<QuotaConsumption> {
        let mut conn = self.manager.clone();
        let mut invocation = self.script.key(key.storage_key());
        invocation.arg(limit).arg(ttl.as_secs());
        let (granted, remaining): (i64, i64) =
            self.with_timeout(invocation.invoke_async(&mut conn)).await?;
        Ok(QuotaConsumption {
            allowed: granted == 1,
            remaining: remaining.max(0) as u32,
        })
    }
}

fn parse_counter(raw: Option<String>, key: &QuotaKey) -> Result<u32> {
    match raw {
        None => Ok(0),
        Some(value) => value.parse::<u32>().map_err(|_| QuotaError::CorruptCounter {
            key: key.storage_key(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geolead_core::CallerId;

    fn key() -> QuotaKey {
        QuotaKey::for_day_of(CallerId::parse("anon-3f2a9c81").unwrap(), Utc::now())
    }

    #[test]
    fn absent_counter_reads_as_zero() {
        assert_eq!(parse_counter(None, &key()).unwrap(), 0);
    }

    #[test]
    fn numeric_counter_parses() {
        assert_eq!(parse_counter(Some("7".to_string()), &key()).unwrap(), 7);
    }

    #[test]
    fn corrupt_counter_fails_closed() {
        let err = parse_counter(Some("not-a-count".to_string()), &key()).unwrap_err();
        assert!(matches!(err, QuotaError::CorruptCounter { .. }));
    }
}
