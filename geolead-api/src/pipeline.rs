//! The admission and search pipeline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use geolead_core::{
    BoundingBox, CallerId, Candidate, CandidateSource, GeoPoint, SpacingSelector,
};
use geolead_policy::{
    CachedVerifier, Decision, EntitlementResolver, PolicyConfig, PolicyEngine, RequestContext,
    Tier, Verdict,
};

use crate::builder::AdmissionEngineBuilder;
use crate::error::{EngineError, Result};

/// Engine tunables. Radius, spacing, and the area precision are operator
/// configuration, never request inputs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidate search radius around the query point, meters.
    pub search_radius_m: f64,
    /// Minimum pairwise distance between returned results, meters.
    pub min_spacing_m: f64,
    /// Decimal places for area bucket codes (3 is roughly 110 m cells).
    pub area_precision: u32,
    pub policy: PolicyConfig,
    /// Optional service-area boundary; queries outside it are rejected.
    pub service_area: Option<BoundingBox>,
    /// Operator override token; requests presenting it bypass quota and
    /// friction entirely.
    pub admin_token: Option<String>,
    /// How long a successful human verification is honored per caller.
    pub verify_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_radius_m: 5_000.0,
            min_spacing_m: 30.0,
            area_precision: 3,
            policy: PolicyConfig::default(),
            service_area: None,
            admin_token: None,
            verify_grace: Duration::from_secs(600),
        }
    }
}

/// One inbound search request, already shaped by the transport layer.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub caller: CallerId,
    pub location: GeoPoint,
    /// Session credential for tier resolution.
    pub credential: Option<String>,
    /// Human-verification token, if the client completed a challenge.
    pub human_token: Option<String>,
    /// Operator override token.
    pub admin_token: Option<String>,
}

/// What one request produced: always a decision, and results when (and only
/// when) the search was actually served.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub decision: Decision,
    pub results: Option<Vec<Candidate>>,
    pub tier: Tier,
    /// Area bucket of the query point, for logs and DTOs.
    pub area_bucket: String,
    pub admin_override: bool,
}

/// Peek result: the decision the caller would get right now, nothing
/// consumed.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub decision: Decision,
    pub tier: Tier,
}

/// Request-level composition of policy, quota, and spatial selection.
///
/// See the crate docs for the pipeline order. The two-step quota contract
/// lives here: `evaluate` before the search, `consume` strictly after it
/// succeeds, never fused, so a failed candidate lookup costs the caller
/// nothing.
#[derive(Debug)]
pub struct AdmissionEngine {
    pub(crate) source: Arc<dyn CandidateSource>,
    pub(crate) entitlements: Arc<dyn EntitlementResolver>,
    pub(crate) verifier: CachedVerifier,
    pub(crate) policy: PolicyEngine,
    pub(crate) selector: SpacingSelector,
    pub(crate) config: EngineConfig,
}

impl AdmissionEngine {
    pub fn builder() -> AdmissionEngineBuilder {
        AdmissionEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full admission and search pipeline for one request.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome> {
        let now = Utc::now();
        self.check_service_area(&request.location)?;
        let area_bucket = request.location.area_bucket(self.config.area_precision);

        // Operator override: full-size results, and no store traffic at
        // all, so the override keeps working during a store outage and can
        // never distort anyone's accounting.
        if self.is_admin_override(request.admin_token.as_deref()) {
            let limits = self.policy.limits_for(Tier::Paid);
            let results = self
                .run_search(request.location, limits.max_results as usize)
                .await?;
            info!(
                caller = %request.caller,
                area = %area_bucket,
                served = results.len(),
                "admin override search"
            );
            return Ok(SearchOutcome {
                decision: Decision {
                    verdict: Verdict::Allow,
                    quota_remaining: limits.daily_limit,
                    max_results: limits.max_results,
                    retry_after: None,
                },
                results: Some(results),
                tier: Tier::Paid,
                area_bucket,
                admin_override: true,
            });
        }

        let tier = self.entitlements.resolve(request.credential.as_deref()).await;
        // Friction is a free-tier mechanism; paid requests skip the
        // verifier entirely rather than paying its latency.
        let human_verified = match tier {
            Tier::Free => {
                self.verifier
                    .is_verified(request.human_token.as_deref(), &request.caller)
                    .await
            }
            Tier::Paid => false,
        };

        let ctx = RequestContext::at(request.caller, tier, human_verified, now);
        let decision = self.policy.evaluate(&ctx).await?;
        if !decision.is_allowed() {
            info!(
                caller = %ctx.caller,
                tier = %tier,
                area = %area_bucket,
                verdict = ?decision.verdict,
                remaining = decision.quota_remaining,
                "search not admitted"
            );
            return Ok(SearchOutcome {
                decision,
                results: None,
                tier,
                area_bucket,
                admin_override: false,
            });
        }

        // Any failure from here up to consumption leaves the counter
        // untouched.
        let results = self
            .run_search(request.location, decision.max_results as usize)
            .await?;

        let consumption = self.policy.consume(&ctx).await?;
        if !consumption.allowed {
            // A concurrent request drained the last unit between the read
            // and the consume. The store's answer wins; the computed
            // results are dropped rather than served unmetered.
            warn!(
                caller = %ctx.caller,
                tier = %tier,
                "quota drained between evaluation and consumption"
            );
            let limits = self.policy.limits_for(tier);
            let blocked = self
                .policy
                .decide(tier, limits.daily_limit, human_verified, now);
            return Ok(SearchOutcome {
                decision: blocked,
                results: None,
                tier,
                area_bucket,
                admin_override: false,
            });
        }

        info!(
            caller = %ctx.caller,
            tier = %tier,
            area = %area_bucket,
            served = results.len(),
            remaining = consumption.remaining,
            "search admitted"
        );
        let mut decision = decision;
        decision.quota_remaining = consumption.remaining;
        Ok(SearchOutcome {
            decision,
            results: Some(results),
            tier,
            area_bucket,
            admin_override: false,
        })
    }

    /// Evaluate policy without consuming quota.
    ///
    /// Served by the same engine so status pages and the search path can
    /// never disagree. Only cached verification proof counts here; a status
    /// query never triggers a live verification.
    pub async fn status(&self, caller: &CallerId, credential: Option<&str>) -> Result<StatusReport> {
        let tier = self.entitlements.resolve(credential).await;
        let human_verified = tier == Tier::Free && self.verifier.has_valid_proof(caller);
        let ctx = RequestContext::new(caller.clone(), tier, human_verified);
        let decision = self.policy.evaluate(&ctx).await?;
        Ok(StatusReport { decision, tier })
    }

    async fn run_search(&self, center: GeoPoint, max_results: usize) -> Result<Vec<Candidate>> {
        let candidates = self
            .source
            .within_radius(center, self.config.search_radius_m)
            .await?;
        Ok(self.selector.select(candidates, max_results))
    }

    fn check_service_area(&self, point: &GeoPoint) -> Result<()> {
        if let Some(bbox) = &self.config.service_area {
            if !bbox.contains(point) {
                return Err(EngineError::OutsideServiceArea {
                    lat: point.lat,
                    lon: point.lon,
                });
            }
        }
        Ok(())
    }

    fn is_admin_override(&self, presented: Option<&str>) -> bool {
        match (self.config.admin_token.as_deref(), presented) {
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.as_bytes(), presented.as_bytes())
            }
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq(b"ops-secret", b"ops-secret"));
        assert!(!constant_time_eq(b"ops-secret", b"ops-secreT"));
        assert!(!constant_time_eq(b"ops-secret", b"ops"));
        assert!(constant_time_eq(b"", b""));
    }
}
