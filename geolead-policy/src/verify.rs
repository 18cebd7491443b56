//! Human-verification collaborators.
//!
//! The engine never validates a verification token itself; it asks a
//! collaborator. Collaborators answer with a plain yes/no and fold their own
//! transport failures into "no", so a flaky upstream can only ever cause
//! extra challenges, never a quiet admission.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use geolead_core::CallerId;

/// Verifies a human-verification token for a caller.
#[async_trait]
pub trait HumanVerifier: Debug + Send + Sync {
    /// True only when the token positively verified. Failures, timeouts,
    /// and rejections are all `false`.
    async fn verify(&self, token: &str, caller: &CallerId) -> bool;
}

/// Verifier for development and tests: every token passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

#[async_trait]
impl HumanVerifier for AcceptAllVerifier {
    async fn verify(&self, _token: &str, _caller: &CallerId) -> bool {
        true
    }
}

/// Verifier that rejects everything; challenges can never be satisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllVerifier;

#[async_trait]
impl HumanVerifier for DenyAllVerifier {
    async fn verify(&self, _token: &str, _caller: &CallerId) -> bool {
        false
    }
}

/// Caches successful verifications per caller for a grace window.
///
/// Without the cache every request in a session would hit the upstream
/// verifier (and fail closed into a fresh challenge whenever it hiccups).
/// A cache entry only ever *skips* a live verification after a prior
/// success for the same caller; it never upgrades a failed one.
#[derive(Debug)]
pub struct CachedVerifier {
    inner: Arc<dyn HumanVerifier>,
    grace: Duration,
    verified_at: RwLock<HashMap<CallerId, Instant>>,
}

impl CachedVerifier {
    pub fn new(inner: Arc<dyn HumanVerifier>, grace: Duration) -> Self {
        CachedVerifier {
            inner,
            grace,
            verified_at: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the caller verified within the grace window.
    pub fn has_valid_proof(&self, caller: &CallerId) -> bool {
        let cache = self.verified_at.read();
        match cache.get(caller) {
            Some(at) => at.elapsed() < self.grace,
            None => false,
        }
    }

    /// Resolve the caller's verification state for this request.
    ///
    /// Cached proof short-circuits; otherwise a present token is verified
    /// live and a success is recorded. No token and no proof is simply
    /// unverified (the policy layer turns that into a challenge).
    pub async fn is_verified(&self, token: Option<&str>, caller: &CallerId) -> bool {
        if self.has_valid_proof(caller) {
            return true;
        }
        let Some(token) = token else {
            return false;
        };
        if token.is_empty() {
            return false;
        }
        if self.inner.verify(token, caller).await {
            let mut cache = self.verified_at.write();
            // Keep stale entries from accumulating across days.
            let grace = self.grace;
            cache.retain(|_, at| at.elapsed() < grace);
            cache.insert(caller.clone(), Instant::now());
            true
        } else {
            tracing::debug!(caller = %caller, "human verification rejected");
            false
        }
    }
}
