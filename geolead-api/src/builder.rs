//! Wiring for [`AdmissionEngine`].
//!
//! The engine takes every collaborator as a handle, so transports and tests
//! assemble it from whatever store, source, and verifier they need.

use std::sync::Arc;

use geolead_core::{CandidateSource, SpacingSelector};
use geolead_policy::{
    CachedVerifier, DenyAllVerifier, EntitlementResolver, HumanVerifier, PolicyEngine,
    StaticEntitlements,
};
use geolead_quota::QuotaStore;

use crate::error::EngineError;
use crate::pipeline::{AdmissionEngine, EngineConfig};

/// Builds an [`AdmissionEngine`].
///
/// A quota store and a candidate source are mandatory. Entitlements default
/// to "everyone is free tier" and the verifier defaults to rejecting every
/// token, which is the safe direction for both.
#[derive(Debug, Default)]
pub struct AdmissionEngineBuilder {
    quota: Option<Arc<dyn QuotaStore>>,
    source: Option<Arc<dyn CandidateSource>>,
    entitlements: Option<Arc<dyn EntitlementResolver>>,
    verifier: Option<Arc<dyn HumanVerifier>>,
    config: EngineConfig,
}

impl AdmissionEngineBuilder {
    pub fn quota(mut self, quota: Arc<dyn QuotaStore>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn source(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn entitlements(mut self, entitlements: Arc<dyn EntitlementResolver>) -> Self {
        self.entitlements = Some(entitlements);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn HumanVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AdmissionEngine, EngineError> {
        let quota = self
            .quota
            .ok_or_else(|| EngineError::Config("a quota store is required".into()))?;
        let source = self
            .source
            .ok_or_else(|| EngineError::Config("a candidate source is required".into()))?;
        let entitlements = self
            .entitlements
            .unwrap_or_else(|| Arc::new(StaticEntitlements::default()));
        let verifier: Arc<dyn HumanVerifier> =
            self.verifier.unwrap_or_else(|| Arc::new(DenyAllVerifier));

        let config = self.config;
        validate(&config)?;

        Ok(AdmissionEngine {
            source,
            entitlements,
            verifier: CachedVerifier::new(verifier, config.verify_grace),
            policy: PolicyEngine::new(quota, config.policy.clone()),
            selector: SpacingSelector::new(config.min_spacing_m),
            config,
        })
    }
}

fn validate(config: &EngineConfig) -> Result<(), EngineError> {
    if !config.search_radius_m.is_finite() || config.search_radius_m <= 0.0 {
        return Err(EngineError::Config(format!(
            "search radius must be positive, got {}",
            config.search_radius_m
        )));
    }
    if !config.min_spacing_m.is_finite() || config.min_spacing_m < 0.0 {
        return Err(EngineError::Config(format!(
            "minimum spacing must be non-negative, got {}",
            config.min_spacing_m
        )));
    }
    config.policy.limits.validate().map_err(EngineError::Config)
}
