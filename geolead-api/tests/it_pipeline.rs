//! End-to-end pipeline tests against in-memory collaborators and a handful
//! of fault-injecting fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use geolead_api::{
    AdmissionEngine, BoundingBox, CallerId, Candidate, CandidateSource, EngineConfig, EngineError,
    GeoPoint, MemoryGeoIndex, MemoryQuotaStore, Poi, PoiCatalog, SearchRequest, Tier, Verdict,
};
use geolead_core::{CoreError, EARTH_RADIUS_METERS};
use geolead_policy::{AcceptAllVerifier, StaticEntitlements};
use geolead_quota::{QuotaConsumption, QuotaError, QuotaKey, QuotaStore};

const PAID_CREDENTIAL: &str = "paid-sub-001";
const ADMIN_TOKEN: &str = "ops-override-secret";

/// Candidate source whose backend is down.
#[derive(Debug)]
struct FailingSource;

#[async_trait]
impl CandidateSource for FailingSource {
    async fn within_radius(
        &self,
        _center: GeoPoint,
        _radius_m: f64,
    ) -> geolead_core::Result<Vec<Candidate>> {
        Err(CoreError::source("spatial index offline"))
    }
}

/// Quota store whose backend is down.
#[derive(Debug)]
struct FailingStore;

#[async_trait]
impl QuotaStore for FailingStore {
    async fn get_usage(&self, _key: &QuotaKey) -> geolead_quota::Result<u32> {
        Err(QuotaError::unavailable("connection refused"))
    }

    async fn check_and_consume(
        &self,
        _key: &QuotaKey,
        _limit: u32,
        _ttl: Duration,
    ) -> geolead_quota::Result<QuotaConsumption> {
        Err(QuotaError::unavailable("connection refused"))
    }
}

/// Store that reads as untouched but denies every consumption, which is what
/// a caller sees when concurrent requests drain the last unit after its
/// evaluation read.
#[derive(Debug)]
struct DrainedStore;

#[async_trait]
impl QuotaStore for DrainedStore {
    async fn get_usage(&self, _key: &QuotaKey) -> geolead_quota::Result<u32> {
        Ok(0)
    }

    async fn check_and_consume(
        &self,
        _key: &QuotaKey,
        _limit: u32,
        _ttl: Duration,
    ) -> geolead_quota::Result<QuotaConsumption> {
        Ok(QuotaConsumption {
            allowed: false,
            remaining: 0,
        })
    }
}

fn meters_to_lon(meters: f64) -> f64 {
    meters * 180.0 / (std::f64::consts::PI * EARTH_RADIUS_METERS)
}

fn poi_east(id: &str, meters: f64) -> Poi {
    Poi {
        id: id.to_string(),
        name: format!("{id} showroom"),
        lat: 0.0,
        lon: meters_to_lon(meters),
        thumbnail: None,
    }
}

/// Points due east of the origin at 10, 15, 40, 45, 200, and 260 meters.
/// With 30 m spacing the nearest-first pass keeps p10, p40, p200, p260.
fn spread_catalog() -> PoiCatalog {
    PoiCatalog::from_points(vec![
        poi_east("p10", 10.0),
        poi_east("p15", 15.0),
        poi_east("p40", 40.0),
        poi_east("p45", 45.0),
        poi_east("p200", 200.0),
        poi_east("p260", 260.0),
    ])
    .expect("catalog")
}

fn origin() -> GeoPoint {
    GeoPoint::new(0.0, 0.0).expect("origin")
}

fn caller(raw: &str) -> CallerId {
    CallerId::parse(raw).expect("caller id")
}

fn test_config() -> EngineConfig {
    EngineConfig {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..EngineConfig::default()
    }
}

fn engine_with_store(store: Arc<dyn QuotaStore>) -> AdmissionEngine {
    AdmissionEngine::builder()
        .quota(store)
        .source(Arc::new(MemoryGeoIndex::new(spread_catalog())))
        .entitlements(Arc::new(StaticEntitlements::new([
            PAID_CREDENTIAL.to_string()
        ])))
        .verifier(Arc::new(AcceptAllVerifier))
        .config(test_config())
        .build()
        .expect("engine")
}

fn engine() -> AdmissionEngine {
    engine_with_store(Arc::new(MemoryQuotaStore::new()))
}

fn request(caller_id: &CallerId) -> SearchRequest {
    SearchRequest {
        caller: caller_id.clone(),
        location: origin(),
        credential: None,
        human_token: None,
        admin_token: None,
    }
}

fn result_ids(outcome: &geolead_api::SearchOutcome) -> Vec<&str> {
    outcome
        .results
        .as_ref()
        .expect("results")
        .iter()
        .map(|c| c.poi.id.as_str())
        .collect()
}

#[tokio::test]
async fn fresh_free_caller_without_token_is_challenged() {
    let engine = engine();
    let id = caller("visitor-fresh-01");

    let outcome = engine.search(request(&id)).await.expect("search");

    assert_eq!(outcome.decision.verdict, Verdict::ChallengeRequired);
    assert_eq!(outcome.decision.quota_remaining, 2);
    assert_eq!(outcome.decision.retry_after, None);
    assert_eq!(outcome.tier, Tier::Free);
    assert!(outcome.results.is_none());
    assert!(!outcome.admin_override);
}

#[tokio::test]
async fn verified_free_caller_is_served_and_charged() {
    let engine = engine();
    let id = caller("visitor-verified-01");

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let outcome = engine.search(req).await.expect("search");

    assert_eq!(outcome.decision.verdict, Verdict::Allow);
    // Free tier caps at one result, and the unit is charged before the
    // outcome is reported.
    assert_eq!(outcome.decision.max_results, 1);
    assert_eq!(outcome.decision.quota_remaining, 1);
    assert_eq!(result_ids(&outcome), vec!["p10"]);
    assert_eq!(outcome.area_bucket, "0.000,0.000");
}

#[tokio::test]
async fn exhausted_free_caller_is_blocked_even_with_token() {
    let engine = engine();
    let id = caller("visitor-heavy-01");

    for _ in 0..2 {
        let mut req = request(&id);
        req.human_token = Some("tok-ok".to_string());
        let outcome = engine.search(req).await.expect("search");
        assert_eq!(outcome.decision.verdict, Verdict::Allow);
    }

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let outcome = engine.search(req).await.expect("search");

    assert_eq!(outcome.decision.verdict, Verdict::Block);
    assert_eq!(outcome.decision.quota_remaining, 0);
    assert!(outcome.decision.retry_after.expect("retry_after") > 0);
    assert!(outcome.results.is_none());
}

#[tokio::test]
async fn paid_caller_is_never_challenged() {
    let engine = engine();
    let id = caller("subscriber-99");

    let mut req = request(&id);
    req.credential = Some(PAID_CREDENTIAL.to_string());
    let outcome = engine.search(req).await.expect("search");

    assert_eq!(outcome.decision.verdict, Verdict::Allow);
    assert_eq!(outcome.tier, Tier::Paid);
    assert_eq!(outcome.decision.max_results, 5);
    assert_eq!(outcome.decision.quota_remaining, 49);
    assert!(outcome.results.is_some());
}

#[tokio::test]
async fn results_respect_minimum_spacing() {
    let engine = engine();
    let id = caller("subscriber-spacing");

    let mut req = request(&id);
    req.credential = Some(PAID_CREDENTIAL.to_string());
    let outcome = engine.search(req).await.expect("search");

    // p15 sits 5 m from p10 and p45 sits 5 m from p40; both fall to the
    // 30 m spacing rule while the far pair survives.
    assert_eq!(result_ids(&outcome), vec!["p10", "p40", "p200", "p260"]);
}

#[tokio::test]
async fn failed_search_costs_no_quota() {
    let store = Arc::new(MemoryQuotaStore::new());
    let engine = AdmissionEngine::builder()
        .quota(store.clone())
        .source(Arc::new(FailingSource))
        .verifier(Arc::new(AcceptAllVerifier))
        .config(test_config())
        .build()
        .expect("engine");
    let id = caller("visitor-unlucky-01");

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let err = engine.search(req).await.unwrap_err();
    assert!(matches!(err, EngineError::Candidates(_)));

    let key = QuotaKey::for_day_of(id, Utc::now());
    assert_eq!(store.get_usage(&key).await.expect("usage"), 0);
}

#[tokio::test]
async fn store_outage_fails_closed() {
    let engine = engine_with_store(Arc::new(FailingStore));
    let id = caller("visitor-outage-01");

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let err = engine.search(req).await.unwrap_err();
    assert!(matches!(err, EngineError::EnforcementUnavailable(_)));

    let err = engine.status(&id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::EnforcementUnavailable(_)));
}

#[tokio::test]
async fn lost_consumption_race_blocks_without_results() {
    let engine = engine_with_store(Arc::new(DrainedStore));
    let id = caller("visitor-racer-01");

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let outcome = engine.search(req).await.expect("search");

    assert_eq!(outcome.decision.verdict, Verdict::Block);
    assert!(outcome.results.is_none());
    assert!(outcome.decision.retry_after.is_some());
}

#[tokio::test]
async fn admin_override_works_during_store_outage() {
    let engine = engine_with_store(Arc::new(FailingStore));
    let id = caller("operator-oncall-01");

    let mut req = request(&id);
    req.admin_token = Some(ADMIN_TOKEN.to_string());
    let outcome = engine.search(req).await.expect("search");

    assert!(outcome.admin_override);
    assert_eq!(outcome.tier, Tier::Paid);
    assert_eq!(outcome.decision.verdict, Verdict::Allow);
    assert_eq!(outcome.decision.quota_remaining, 50);
    assert_eq!(
        result_ids(&outcome),
        vec!["p10", "p40", "p200", "p260"]
    );
}

#[tokio::test]
async fn wrong_admin_token_takes_the_normal_path() {
    let engine = engine();
    let id = caller("visitor-imposter-01");

    let mut req = request(&id);
    req.admin_token = Some("ops-override-secreT".to_string());
    let outcome = engine.search(req).await.expect("search");

    assert!(!outcome.admin_override);
    assert_eq!(outcome.decision.verdict, Verdict::ChallengeRequired);
}

#[tokio::test]
async fn status_reports_without_consuming() {
    let engine = engine();
    let id = caller("visitor-curious-01");

    for _ in 0..5 {
        let report = engine.status(&id, None).await.expect("status");
        assert_eq!(report.decision.verdict, Verdict::ChallengeRequired);
        assert_eq!(report.decision.quota_remaining, 2);
    }

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    engine.search(req).await.expect("search");

    let report = engine.status(&id, None).await.expect("status");
    assert_eq!(report.decision.quota_remaining, 1);
}

#[tokio::test]
async fn status_honors_paid_credential() {
    let engine = engine();
    let id = caller("subscriber-status");

    let report = engine
        .status(&id, Some(PAID_CREDENTIAL))
        .await
        .expect("status");

    assert_eq!(report.tier, Tier::Paid);
    assert_eq!(report.decision.verdict, Verdict::Allow);
    assert_eq!(report.decision.quota_remaining, 50);
}

#[tokio::test]
async fn out_of_area_is_rejected_before_any_store_traffic() {
    let mut config = test_config();
    config.service_area = Some(BoundingBox::new(16.0, 108.1, 16.12, 108.3).expect("bbox"));
    // A store that errors on contact proves the boundary check runs first.
    let engine = AdmissionEngine::builder()
        .quota(Arc::new(FailingStore))
        .source(Arc::new(MemoryGeoIndex::new(spread_catalog())))
        .config(config)
        .build()
        .expect("engine");
    let id = caller("visitor-abroad-01");

    let err = engine.search(request(&id)).await.unwrap_err();
    assert!(matches!(err, EngineError::OutsideServiceArea { .. }));
}

#[tokio::test]
async fn verification_proof_carries_across_requests() {
    let engine = engine();
    let id = caller("visitor-returning-01");

    let mut req = request(&id);
    req.human_token = Some("tok-ok".to_string());
    let first = engine.search(req).await.expect("search");
    assert_eq!(first.decision.verdict, Verdict::Allow);

    // Within the grace window the cached proof stands in for the token.
    let second = engine.search(request(&id)).await.expect("search");
    assert_eq!(second.decision.verdict, Verdict::Allow);
    assert_eq!(second.decision.quota_remaining, 0);
}
