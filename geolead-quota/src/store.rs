//! The quota store abstraction.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::key::QuotaKey;

/// Outcome of an atomic consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConsumption {
    /// Whether a unit was consumed.
    pub allowed: bool,
    /// Units left under the limit after this attempt (0 when denied).
    pub remaining: u32,
}

/// Per-(caller, day) usage counters shared across process instances.
///
/// Counter lifecycle for one key: absent, then created at 1 with the TTL on
/// the first successful consume, then incremented up to the limit, then
/// denials until the TTL expires the key. Counts never decrease within a
/// day and never exceed the limit, no matter how many callers race.
#[async_trait]
pub trait QuotaStore: Debug + Send + Sync {
    /// Current usage for the key; 0 when the key is absent.
    ///
    /// A transport failure is an error, never a silent 0. A 0 from this
    /// method always means "the store answered and the key is absent or
    /// fresh".
    async fn get_usage(&self, key: &QuotaKey) -> Result<u32>;

    /// Atomically consume one unit if usage is below `limit`.
    ///
    /// The check and the increment happen in a single store round trip, so
    /// two concurrent calls against a key one unit under its limit can
    /// never both succeed. On the first consume for a key the counter is
    /// created with `ttl`, after which it self-expires; nothing deletes
    /// quota keys explicitly.
    async fn check_and_consume(
        &self,
        key: &QuotaKey,
        limit: u32,
        ttl: Duration,
    ) -> Result<QuotaConsumption>;
}
