//! The policy engine: tier + usage + verification state -> decision.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use geolead_core::CallerId;
use geolead_quota::{QuotaConsumption, QuotaKey, QuotaStore, Result};

use crate::decision::{Decision, Verdict};
use crate::tier::{PolicyLimits, Tier, TierLimits};

/// Tunables for the policy engine.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub limits: PolicyLimits,
    /// TTL attached to a quota counter on first use (one day).
    pub counter_ttl: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            limits: PolicyLimits::default(),
            counter_ttl: Duration::from_secs(86_400),
        }
    }
}

/// Everything `evaluate` needs to know about one request.
///
/// The verification flag is the *resolved* state (live verification or
/// cached proof, handled upstream); the engine treats it as a fact. `now`
/// is injected so decisions are a pure function of their inputs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub caller: CallerId,
    pub tier: Tier,
    pub human_verified: bool,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(caller: CallerId, tier: Tier, human_verified: bool) -> Self {
        RequestContext {
            caller,
            tier,
            human_verified,
            now: Utc::now(),
        }
    }

    /// Context at an explicit point in time.
    pub fn at(caller: CallerId, tier: Tier, human_verified: bool, now: DateTime<Utc>) -> Self {
        RequestContext {
            caller,
            tier,
            human_verified,
            now,
        }
    }

    /// Quota partition key for this request's calendar day.
    pub fn quota_key(&self) -> QuotaKey {
        QuotaKey::for_day_of(self.caller.clone(), self.now)
    }
}

/// Composes tier limits, quota usage, and the friction flag into a
/// [`Decision`], and owns the post-search consumption step.
///
/// The store handle is injected at construction; the engine holds no other
/// state and adds no locking of its own. Counter atomicity is entirely the
/// store's concern, because an in-process lock could not cover multiple
/// server instances anyway.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    quota: Arc<dyn QuotaStore>,
    config: PolicyConfig,
}

impl PolicyEngine {
    pub fn new(quota: Arc<dyn QuotaStore>, config: PolicyConfig) -> Self {
        PolicyEngine { quota, config }
    }

    pub fn limits_for(&self, tier: Tier) -> TierLimits {
        self.config.limits.for_tier(tier)
    }

    /// Pure decision function.
    ///
    /// Precedence: exhausted quota blocks before anything else, so an
    /// unverified caller with nothing left sees BLOCK, not a challenge.
    /// Friction only exists for the free tier; a paid caller is never
    /// challenged regardless of the verification flag.
    pub fn decide(
        &self,
        tier: Tier,
        usage: u32,
        human_verified: bool,
        now: DateTime<Utc>,
    ) -> Decision {
        let limits = self.config.limits.for_tier(tier);

        // Exactly-at-limit blocks; there is no grace unit.
        if usage >= limits.daily_limit {
            return Decision {
                verdict: Verdict::Block,
                quota_remaining: 0,
                max_results: limits.max_results,
                retry_after: Some(seconds_until_reset(now)),
            };
        }

        let quota_remaining = limits.daily_limit - usage;
        if tier == Tier::Free && !human_verified {
            return Decision {
                verdict: Verdict::ChallengeRequired,
                quota_remaining,
                max_results: limits.max_results,
                retry_after: None,
            };
        }

        Decision {
            verdict: Verdict::Allow,
            quota_remaining,
            max_results: limits.max_results,
            retry_after: None,
        }
    }

    /// Read today's usage and decide. Consumes nothing: this is the "peek"
    /// half of the two-step contract and also serves status queries.
    pub async fn evaluate(&self, ctx: &RequestContext) -> Result<Decision> {
        let usage = self.quota.get_usage(&ctx.quota_key()).await?;
        let decision = self.decide(ctx.tier, usage, ctx.human_verified, ctx.now);
        debug!(
            caller = %ctx.caller,
            tier = %ctx.tier,
            usage,
            verdict = ?decision.verdict,
            "policy evaluated"
        );
        Ok(decision)
    }

    /// Charge one unit of quota for a served search.
    ///
    /// Hard contract: called only after `evaluate` returned ALLOW *and* the
    /// search completed, so a failed search never costs quota. The atomic
    /// re-check in the store is authoritative; `allowed == false` here means
    /// a concurrent request drained the last unit since evaluation, and the
    /// caller must treat the request as blocked rather than serve results.
    pub async fn consume(&self, ctx: &RequestContext) -> Result<QuotaConsumption> {
        let limits = self.config.limits.for_tier(ctx.tier);
        self.quota
            .check_and_consume(&ctx.quota_key(), limits.daily_limit, self.config.counter_ttl)
            .await
    }
}

/// Seconds until the next UTC midnight, when a fresh calendar day (and so a
/// fresh quota key) begins. Always at least 1.
///
/// This is the one retry-after rule in the system. The counter's own TTL is
/// only garbage collection for the old key and never shortens or extends
/// the wait reported to callers.
pub fn seconds_until_reset(now: DateTime<Utc>) -> u64 {
    let next_day = now.date_naive().succ_opt().expect("calendar overflow");
    let midnight = next_day
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    (midnight - now).num_seconds().max(1) as u64
}
